use std::f32::consts::PI;
use std::io::Write;

use nn_shader::{Dataset, Label, NetworkBuilder, Sample, ShaderGenerator};

const RINGS: usize = 3;
const POINTS_PER_RING: usize = 50;

/// Concentric rings of radius 1, 4 and 7; neighbouring rings get opposite labels.
fn rings() -> Vec<Sample> {
    let mut samples = Vec::with_capacity(RINGS * POINTS_PER_RING);
    for ring in 0..RINGS {
        let radius = (ring * 3 + 1) as f32;
        let label = if ring % 2 == 0 {
            Label::Negative
        } else {
            Label::Positive
        };
        for i in 0..POINTS_PER_RING {
            let angle = i as f32 * 2.0 * PI / POINTS_PER_RING as f32;
            samples.push(Sample::new(angle.cos() * radius, angle.sin() * radius, label));
        }
    }
    samples
}

fn main() -> nn_shader::Result<()> {
    let samples = rings();

    // `cargo run --example circles -- circles.dat` also saves the dataset.
    if let Some(path) = std::env::args().nth(1) {
        let mut out = std::fs::File::create(&path)
            .map_err(|e| nn_shader::Error::InvalidData(format!("{path}: {e}")))?;
        for s in &samples {
            let class = if s.label == Label::Positive { 1 } else { 0 };
            writeln!(out, "{}\t{}\t{class}", s.x, s.y)
                .map_err(|e| nn_shader::Error::InvalidData(format!("{path}: {e}")))?;
        }
        println!("wrote {} samples to {path}", samples.len());
    }

    let mut trainer = NetworkBuilder::from_hidden(&[8, 8])?
        .build_with_seed(Dataset::from_samples(samples), 0)?;

    for _ in 0..400 {
        let mse = trainer.learn();
        if trainer.epoch() % 50 == 0 {
            println!("epoch={} mse={mse:.6}", trainer.epoch());
        }
    }
    println!("accuracy={:.3}", trainer.accuracy());

    let net = trainer.network();
    let shader = ShaderGenerator::for_network(net).fragment_shader(net.weights().len())?;
    println!("{shader}");
    Ok(())
}
