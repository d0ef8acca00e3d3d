//! Activation functions.
//!
//! Each variant pairs a scalar activation with its derivative (taken with
//! respect to the pre-activation) and with the GLSL body the shader generator
//! emits for it. Both the CPU trainer and the shader saturate for large inputs
//! instead of overflowing `exp`.

use std::str::FromStr;

use crate::{Error, Result, Topology};

/// `tanh` returns `±1` beyond this magnitude.
pub const TANH_CLAMP: f64 = 42.0;
/// Logistic activation returns `±1` beyond this magnitude; both derivatives are
/// 0 beyond it.
pub const LOGISTIC_CLAMP: f64 = 84.0;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Element-wise activation function, selected once per network.
pub enum Activation {
    Tanh,
    /// Logistic rescaled to `(-1, 1)`.
    Logistic,
    /// Hard threshold to `±1`; its derivative is taken as 1.
    Step,
    Linear,
}

impl Activation {
    /// A lone perceptron (one trainable layer) uses `Step`; everything else `Tanh`.
    pub fn for_topology(topology: &Topology) -> Self {
        if topology.trainable_layers().count() == 1 {
            Activation::Step
        } else {
            Activation::Tanh
        }
    }

    #[inline]
    pub fn activate(self, x: f64) -> f64 {
        match self {
            Activation::Tanh => {
                // e^(2x) overflows long before tanh stops being ±1.
                if x > TANH_CLAMP {
                    return 1.0;
                }
                if x < -TANH_CLAMP {
                    return -1.0;
                }
                let powe = (2.0 * x).exp();
                (powe - 1.0) / (powe + 1.0)
            }
            Activation::Logistic => {
                if x > LOGISTIC_CLAMP {
                    return 1.0;
                }
                if x < -LOGISTIC_CLAMP {
                    return -1.0;
                }
                2.0 / (1.0 + (-x).exp()) - 1.0
            }
            Activation::Step => {
                if x < 0.0 {
                    -1.0
                } else {
                    1.0
                }
            }
            Activation::Linear => x,
        }
    }

    /// Derivative with respect to the pre-activation `x`.
    #[inline]
    pub fn derive(self, x: f64) -> f64 {
        match self {
            Activation::Tanh => {
                if !(-LOGISTIC_CLAMP..=LOGISTIC_CLAMP).contains(&x) {
                    return 0.0;
                }
                // sech^2(x) = 4 / (e^x + e^-x)^2
                4.0 * (x.exp() + (-x).exp()).powi(-2)
            }
            Activation::Logistic => {
                if !(-LOGISTIC_CLAMP..=LOGISTIC_CLAMP).contains(&x) {
                    return 0.0;
                }
                2.0 / ((1.0 + (-x).exp()) * (1.0 + x.exp()))
            }
            Activation::Step | Activation::Linear => 1.0,
        }
    }

    /// GLSL definition of `float activate(float x)` matching [`Activation::activate`].
    pub fn glsl(self) -> &'static str {
        match self {
            Activation::Tanh => {
                "float activate(float x) {
  x = clamp(x, -42.0, 42.0);
  float powe = exp(2.0 * x);
  return (powe - 1.0) / (powe + 1.0);
}"
            }
            Activation::Logistic => {
                "float activate(float x) {
  x = clamp(x, -84.0, 84.0);
  return 2.0 / (1.0 + exp(-x)) - 1.0;
}"
            }
            Activation::Step => {
                "float activate(float x) {
  return step(0.0, x) * 2.0 - 1.0;
}"
            }
            Activation::Linear => {
                "float activate(float x) {
  return x;
}"
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Tanh => "tanh",
            Activation::Logistic => "logistic",
            Activation::Step => "step",
            Activation::Linear => "linear",
        }
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tanh" => Ok(Activation::Tanh),
            "logistic" | "sigmoid" => Ok(Activation::Logistic),
            "step" => Ok(Activation::Step),
            "linear" | "identity" => Ok(Activation::Linear),
            other => Err(Error::InvalidConfig(format!(
                "unknown activation {other:?}, expected tanh, logistic, step or linear"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_derivative(act: Activation, x: f64) -> f64 {
        let eps = 1e-6;
        (act.activate(x + eps) - act.activate(x - eps)) / (2.0 * eps)
    }

    #[test]
    fn tanh_matches_std_and_saturates() {
        for x in [-3.0, -0.5, 0.0, 0.25, 2.0] {
            assert!((Activation::Tanh.activate(x) - f64::tanh(x)).abs() < 1e-12);
        }
        assert_eq!(Activation::Tanh.activate(1e6), 1.0);
        assert_eq!(Activation::Tanh.activate(-1e6), -1.0);
        assert_eq!(Activation::Tanh.derive(100.0), 0.0);
        assert!(Activation::Tanh.derive(60.0).is_finite());
    }

    #[test]
    fn logistic_is_odd_and_saturates() {
        assert!(Activation::Logistic.activate(0.0).abs() < 1e-12);
        let a = Activation::Logistic.activate(1.5);
        let b = Activation::Logistic.activate(-1.5);
        assert!((a + b).abs() < 1e-12);
        assert_eq!(Activation::Logistic.activate(500.0), 1.0);
        assert_eq!(Activation::Logistic.activate(-500.0), -1.0);
        assert_eq!(Activation::Logistic.derive(-85.0), 0.0);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        for act in [Activation::Tanh, Activation::Logistic, Activation::Linear] {
            for x in [-2.0, -0.3, 0.0, 0.7, 3.0] {
                let analytic = act.derive(x);
                let numeric = numeric_derivative(act, x);
                assert!(
                    (analytic - numeric).abs() < 1e-6,
                    "{act:?} at {x}: analytic={analytic} numeric={numeric}"
                );
            }
        }
    }

    #[test]
    fn step_is_a_sign_function() {
        assert_eq!(Activation::Step.activate(-0.001), -1.0);
        assert_eq!(Activation::Step.activate(0.0), 1.0);
        assert_eq!(Activation::Step.activate(3.0), 1.0);
        assert_eq!(Activation::Step.derive(-5.0), 1.0);
    }

    #[test]
    fn selection_policy() {
        let perceptron = Topology::new(&[], false).unwrap();
        let mlp = Topology::new(&[4], false).unwrap();
        let rbf = Topology::new(&[4], true).unwrap();
        let deep_rbf = Topology::new(&[4, 3], true).unwrap();
        assert_eq!(Activation::for_topology(&perceptron), Activation::Step);
        assert_eq!(Activation::for_topology(&mlp), Activation::Tanh);
        assert_eq!(Activation::for_topology(&rbf), Activation::Step);
        assert_eq!(Activation::for_topology(&deep_rbf), Activation::Tanh);
    }

    #[test]
    fn parses_names() {
        for act in [
            Activation::Tanh,
            Activation::Logistic,
            Activation::Step,
            Activation::Linear,
        ] {
            assert_eq!(act.name().parse::<Activation>().unwrap(), act);
        }
        assert!("relu".parse::<Activation>().is_err());
    }
}
