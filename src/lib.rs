//! A small feed-forward classifier for 2-D points, paired with a GLSL generator.
//!
//! `nn-shader` trains a multilayer perceptron (optionally fronted by a layer of
//! Gaussian RBF units) with per-sample backpropagation and momentum, and emits
//! a fragment shader that evaluates the very same network on the GPU so the
//! decision boundary can be drawn in real time.
//!
//! # One layout, two interpreters
//!
//! All weights live in one flat `f32` array ([`Network::weights`]). The CPU
//! trainer and the generated shader both index it with the same traversal:
//!
//! - RBF layer (if any): `mean_x, mean_y, variance` per unit,
//! - then each weighted-sum layer, unit by unit: bias, then one weight per
//!   source unit.
//!
//! [`Layout::connections`] and [`ShaderGenerator::equations`] each enumerate
//! that order independently; debug builds assert they agree.
//!
//! # Panics vs `Result`
//!
//! - Setup APIs ([`Topology::new`], [`NetworkBuilder`], [`Dataset::load`],
//!   [`KMeans::fit`], [`ShaderGenerator::fragment_shader`]) validate and return
//!   [`Result`].
//! - The per-sample hot path ([`Network::forward`], [`Network::backward`],
//!   [`Network::update`], [`Trainer::learn`]) does not allocate and relies on
//!   invariants established at construction.
//!
//! # Quick start
//!
//! ```rust
//! use nn_shader::{Dataset, Label, NetworkBuilder, Sample, ShaderGenerator};
//!
//! # fn main() -> nn_shader::Result<()> {
//! let data = Dataset::from_samples(vec![
//!     Sample::new(1.0, 1.0, Label::Positive),
//!     Sample::new(-1.0, -1.0, Label::Negative),
//!     Sample::new(1.0, -1.0, Label::Positive),
//!     Sample::new(-1.0, 1.0, Label::Negative),
//! ]);
//!
//! let mut trainer = NetworkBuilder::new()
//!     .add_hidden(5)?
//!     .add_hidden(5)?
//!     .build_with_seed(data, 0)?;
//!
//! let net = trainer.network();
//! let shader = ShaderGenerator::for_network(net).fragment_shader(net.weights().len())?;
//! assert!(shader.contains("float val = activate("));
//!
//! for _ in 0..10 {
//!     let _mse = trainer.learn();
//! }
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod config;
pub mod data;
pub mod error;
pub mod kmeans;
pub mod layout;
pub mod network;
pub mod shader;
pub mod shared;
pub mod topology;
pub mod train;

pub use activation::Activation;
pub use builder::NetworkBuilder;
pub use config::{Mode, TrainConfig};
pub use data::{Dataset, Label, Sample};
pub use error::{Error, Result};
pub use kmeans::{Cluster, KMeans};
pub use layout::{Connection, Layout, Span};
pub use network::Network;
pub use shader::{Equations, ShaderGenerator};
pub use shared::{ContinuousTraining, SharedWeights, spawn_continuous};
pub use topology::Topology;
pub use train::Trainer;
