//! Trainer builder.
//!
//! `NetworkBuilder` is the recommended way to set up a run. It collects the
//! hidden-layer widths, whether the first hidden layer is RBF, and optional
//! overrides, then:
//!
//! - derives the [`Topology`] (`2 -> hidden.. -> 1`),
//! - picks the activation (step for a lone perceptron, tanh otherwise) and the
//!   MLP or RBF hyper-parameter preset unless overridden,
//! - draws the initial weights,
//! - seeds the RBF layer with k-means when enabled,
//!
//! and hands back a [`Trainer`] ready for its first epoch. One seeded RNG
//! drives weight init, k-means seeding and every later shuffle.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{Activation, Dataset, Error, KMeans, Network, Result, Topology, TrainConfig, Trainer};

#[derive(Debug, Clone, Default)]
/// Builder for a [`Trainer`].
///
/// ```rust
/// use nn_shader::{Dataset, Label, NetworkBuilder, Sample};
///
/// # fn main() -> nn_shader::Result<()> {
/// let data = Dataset::from_samples(vec![
///     Sample::new(1.0, 1.0, Label::Positive),
///     Sample::new(-1.0, -1.0, Label::Negative),
/// ]);
/// let mut trainer = NetworkBuilder::new()
///     .add_hidden(4)?
///     .build_with_seed(data, 0)?;
/// let _mse = trainer.learn();
/// # Ok(())
/// # }
/// ```
pub struct NetworkBuilder {
    hidden: Vec<usize>,
    rbf: bool,
    activation: Option<Activation>,
    config: Option<TrainConfig>,
    kmeans_max_iterations: Option<usize>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a list of hidden widths, e.g. parsed from a command line.
    pub fn from_hidden(hidden: &[usize]) -> Result<Self> {
        let mut b = Self::new();
        for &width in hidden {
            b = b.add_hidden(width)?;
        }
        Ok(b)
    }

    /// Append a hidden layer of `width` units.
    pub fn add_hidden(mut self, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidConfig(
                "hidden layer width must be > 0".to_owned(),
            ));
        }
        self.hidden.push(width);
        Ok(self)
    }

    /// Treat the first hidden layer as RBF units seeded by k-means.
    pub fn rbf(mut self, rbf: bool) -> Self {
        self.rbf = rbf;
        self
    }

    pub fn activation(mut self, activation: Activation) -> Self {
        self.activation = Some(activation);
        self
    }

    pub fn config(mut self, config: TrainConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Cap the k-means loop; by default it runs to a fixed point.
    pub fn kmeans_max_iterations(mut self, n: usize) -> Self {
        self.kmeans_max_iterations = Some(n);
        self
    }

    pub fn topology(&self) -> Result<Topology> {
        Topology::new(&self.hidden, self.rbf)
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, data: Dataset, seed: u64) -> Result<Trainer> {
        self.build_with_rng(data, StdRng::seed_from_u64(seed))
    }

    /// Build using the provided RNG; the trainer keeps it for shuffling.
    pub fn build_with_rng(self, mut data: Dataset, mut rng: StdRng) -> Result<Trainer> {
        let topology = self.topology()?;
        let activation = self
            .activation
            .unwrap_or_else(|| Activation::for_topology(&topology));
        let config = self
            .config
            .unwrap_or_else(|| TrainConfig::for_topology(&topology));
        config.validate()?;
        if data.is_empty() {
            return Err(Error::InvalidData(
                "train dataset must not be empty".to_owned(),
            ));
        }

        let centers = topology.rbf_centers();
        let mut network = Network::new_with_rng(topology, activation, &mut rng);

        if let Some(k) = centers {
            let mut kmeans = KMeans::new(k)?;
            if let Some(n) = self.kmeans_max_iterations {
                kmeans = kmeans.with_max_iterations(n);
            }
            let clusters = kmeans.fit(&mut data, &mut rng)?;
            network.set_rbf_clusters(&clusters)?;
        }

        Trainer::new(network, data, config, rng)
    }
}
