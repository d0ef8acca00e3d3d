//! Epoch loop.
//!
//! `Trainer` is the single context object that owns a network, its dataset,
//! the hyper-parameters and the RNG used for shuffling. An external trigger
//! (a redraw callback, a loop, a thread) calls [`Trainer::learn`] repeatedly.

use rand::rngs::StdRng;

use crate::{Dataset, Error, Mode, Network, Result, TrainConfig};

#[derive(Debug, Clone)]
pub struct Trainer {
    network: Network,
    data: Dataset,
    config: TrainConfig,
    rng: StdRng,
    epoch: u64,
}

impl Trainer {
    /// Wrap a ready network. The RNG keeps driving the per-epoch shuffles.
    pub fn new(network: Network, data: Dataset, config: TrainConfig, rng: StdRng) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidData(
                "train dataset must not be empty".to_owned(),
            ));
        }
        config.validate()?;

        Ok(Self {
            network,
            data,
            config,
            rng,
            epoch: 0,
        })
    }

    #[inline]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[inline]
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    #[inline]
    pub fn into_network(self) -> Network {
        self.network
    }

    #[inline]
    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    #[inline]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Number of completed `learn` calls. Never reset.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Run one invocation of the configured [`Mode`] and return its error.
    ///
    /// - `FullPass`: every sample once, in a freshly shuffled order; returns
    ///   `sum(0.5 * err^2) / len`.
    /// - `SingleSample`: sample `epoch % len` of the permutation; returns
    ///   `0.5 * err^2`. The permutation is reshuffled whenever the position
    ///   wraps to 0.
    pub fn learn(&mut self) -> f64 {
        let mse = match self.config.mode {
            Mode::FullPass => {
                let mut total = 0.0;
                for pos in 0..self.data.len() {
                    total += self.step(pos);
                }
                total / self.data.len() as f64
            }
            Mode::SingleSample => {
                let pos = (self.epoch % self.data.len() as u64) as usize;
                self.step(pos)
            }
        };
        self.epoch += 1;
        mse
    }

    /// Train on the `pos`-th sample of the permutation; returns `0.5 * err^2`.
    fn step(&mut self, pos: usize) -> f64 {
        if pos == 0 {
            self.data.shuffle(&mut self.rng);
        }
        let sample = *self.data.shuffled(pos);
        let err = self.network.train_sample(
            sample.x,
            sample.y,
            sample.target(),
            self.config.learn_rate,
            self.config.momentum,
        );
        0.5 * err * err
    }

    /// Mean of `0.5 * err^2` over the dataset, without training.
    pub fn evaluate_mse(&self) -> f64 {
        let mut scratch = self.network.clone();
        let total: f64 = self
            .data
            .samples()
            .iter()
            .map(|s| {
                let err = s.target() - scratch.forward(s.x, s.y);
                0.5 * err * err
            })
            .sum();
        total / self.data.len() as f64
    }

    /// Fraction of samples whose output has the sign of their target.
    pub fn accuracy(&self) -> f64 {
        let mut scratch = self.network.clone();
        let hits = self
            .data
            .samples()
            .iter()
            .filter(|s| {
                let out = scratch.forward(s.x, s.y);
                (out >= 0.0) == (s.target() > 0.0)
            })
            .count();
        hits as f64 / self.data.len() as f64
    }
}
