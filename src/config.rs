//! Training hyper-parameters.
//!
//! Two presets exist, matching the two network families:
//!
//! - plain MLP: learn rate `0.01`, momentum `0.9`
//! - RBF front end: learn rate `0.0001`, momentum `0.95`
//!
//! With the `serde` feature, a config can also be read from JSON:
//!
//! ```json
//! { "learn_rate": 0.01, "momentum": 0.9, "mode": "full_pass" }
//! ```

use crate::{Error, Result, Topology};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// How much work one call to `Trainer::learn` does.
pub enum Mode {
    /// One full pass over the dataset; returns the mean of `0.5 * err^2`.
    #[default]
    FullPass,
    /// One sample, cycling through the permutation; returns `0.5 * err^2`.
    SingleSample,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub learn_rate: f64,
    pub momentum: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: Mode,
}

impl TrainConfig {
    pub fn mlp() -> Self {
        Self {
            learn_rate: 0.01,
            momentum: 0.9,
            mode: Mode::FullPass,
        }
    }

    pub fn rbf() -> Self {
        Self {
            learn_rate: 0.0001,
            momentum: 0.95,
            mode: Mode::FullPass,
        }
    }

    /// Preset for the network family of `topology`.
    pub fn for_topology(topology: &Topology) -> Self {
        if topology.is_rbf() {
            Self::rbf()
        } else {
            Self::mlp()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learn_rate.is_finite() && self.learn_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learn rate must be finite and > 0, got {}",
                self.learn_rate
            )));
        }
        if !(self.momentum.is_finite() && (0.0..1.0).contains(&self.momentum)) {
            return Err(Error::InvalidConfig(format!(
                "momentum must be finite and in [0,1), got {}",
                self.momentum
            )));
        }
        Ok(())
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self::mlp()
    }
}

#[cfg(feature = "serde")]
impl TrainConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: TrainConfig = serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a JSON config file.
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidConfig(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}
