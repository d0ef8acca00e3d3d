use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use nn_shader::{
    Activation, Dataset, Mode, NetworkBuilder, Result, ShaderGenerator, TrainConfig, Trainer,
    spawn_continuous,
};

/// Train a 2-D point classifier and emit the matching fragment shader.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Dataset file: one `x<TAB>y<TAB>class` sample per line, class 0 or 1.
    #[arg(short = 'f', long = "file", default_value = "spiral.dat")]
    file: PathBuf,

    /// Hidden layer widths; `5 5` builds a 2-5-5-1 network.
    hidden: Vec<usize>,

    /// Make the first hidden layer RBF units seeded by k-means.
    #[arg(long)]
    rbf: bool,

    /// Activation override: tanh, logistic, step or linear.
    #[arg(long)]
    activation: Option<Activation>,

    #[arg(long)]
    learn_rate: Option<f64>,

    #[arg(long)]
    momentum: Option<f64>,

    /// Train on one sample per invocation instead of a full pass.
    #[arg(long)]
    single_sample: bool,

    /// Train continuously on a background thread.
    #[arg(long)]
    threaded: bool,

    /// Number of `learn` invocations; 0 keeps training until interrupted.
    #[arg(long, default_value_t = 1000)]
    epochs: u64,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write the fragment shader here instead of printing it.
    #[arg(long)]
    shader: Option<PathBuf>,

    /// Stop the k-means seeding after this many center updates.
    #[arg(long)]
    kmeans_max_iterations: Option<usize>,
}

fn build(args: &Args) -> Result<Trainer> {
    let data = Dataset::load(&args.file)?;
    info!("loaded {} samples from {}", data.len(), args.file.display());

    let mut builder = NetworkBuilder::from_hidden(&args.hidden)?.rbf(args.rbf);
    let topology = builder.topology()?;

    let mut config = TrainConfig::for_topology(&topology);
    if let Some(lr) = args.learn_rate {
        config.learn_rate = lr;
    }
    if let Some(m) = args.momentum {
        config.momentum = m;
    }
    if args.single_sample {
        config.mode = Mode::SingleSample;
    }
    builder = builder.config(config);

    if let Some(act) = args.activation {
        builder = builder.activation(act);
    }
    if let Some(n) = args.kmeans_max_iterations {
        builder = builder.kmeans_max_iterations(n);
    }
    builder.build_with_seed(data, args.seed)
}

fn emit_shader(args: &Args, trainer: &Trainer) -> Result<()> {
    let net = trainer.network();
    let source = ShaderGenerator::for_network(net).fragment_shader(net.weights().len())?;
    match &args.shader {
        Some(path) => {
            std::fs::write(path, source).map_err(|e| {
                nn_shader::Error::InvalidData(format!("failed to write {}: {e}", path.display()))
            })?;
            info!("wrote fragment shader to {}", path.display());
        }
        None => print!("{source}"),
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let mut trainer = build(args)?;
    emit_shader(args, &trainer)?;

    if args.threaded {
        let limit = (args.epochs > 0).then_some(args.epochs);
        let run = spawn_continuous(trainer, limit, |epoch, mse| {
            println!("{epoch}\t{mse:.6}");
        });
        if let Some(trainer) = run.join() {
            info!("final accuracy {:.3}", trainer.accuracy());
        } else {
            error!("training thread panicked");
        }
        return Ok(());
    }

    while args.epochs == 0 || trainer.epoch() < args.epochs {
        let mse = trainer.learn();
        println!("{}\t{mse:.6}", trainer.epoch());
    }
    info!("final accuracy {:.3}", trainer.accuracy());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
