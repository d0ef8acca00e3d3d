//! Network shape.
//!
//! A `Topology` lists every layer width, input and output included. The input
//! layer is always 2 wide (the `x`/`y` of a sample) and the output layer is a
//! single unit. When `rbf` is set, layer 1 holds Gaussian basis units instead
//! of weighted-sum units.

use std::ops::RangeInclusive;

use crate::{Error, Result};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    sizes: Vec<usize>,
    rbf: bool,
}

impl Topology {
    pub const INPUT_DIM: usize = 2;
    pub const OUTPUT_DIM: usize = 1;

    /// Build `2 -> hidden.. -> 1`.
    ///
    /// An empty `hidden` list yields a single perceptron. With `rbf` set the
    /// first hidden width becomes the number of RBF centers.
    pub fn new(hidden: &[usize], rbf: bool) -> Result<Self> {
        let mut sizes = Vec::with_capacity(hidden.len() + 2);
        sizes.push(Self::INPUT_DIM);
        sizes.extend_from_slice(hidden);
        sizes.push(Self::OUTPUT_DIM);
        Self::from_sizes(sizes, rbf)
    }

    /// Build from a full width list (input and output included).
    pub fn from_sizes(sizes: Vec<usize>, rbf: bool) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(Error::InvalidConfig(
                "sizes must include input and output dims".to_owned(),
            ));
        }
        if sizes[0] != Self::INPUT_DIM {
            return Err(Error::InvalidConfig(format!(
                "input layer must be {} wide, got {}",
                Self::INPUT_DIM,
                sizes[0]
            )));
        }
        if sizes[sizes.len() - 1] != Self::OUTPUT_DIM {
            return Err(Error::InvalidConfig(format!(
                "output layer must be {} wide, got {}",
                Self::OUTPUT_DIM,
                sizes[sizes.len() - 1]
            )));
        }
        if let Some(layer) = sizes.iter().position(|&w| w == 0) {
            return Err(Error::InvalidConfig(format!(
                "all layer sizes must be > 0, layer {layer} is empty"
            )));
        }
        if rbf && sizes.len() < 3 {
            return Err(Error::InvalidConfig(
                "an rbf network needs at least one hidden layer".to_owned(),
            ));
        }

        Ok(Self { sizes, rbf })
    }

    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Number of layers, input included.
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn width(&self, layer: usize) -> usize {
        self.sizes[layer]
    }

    #[inline]
    pub fn output_layer(&self) -> usize {
        self.sizes.len() - 1
    }

    #[inline]
    pub fn is_rbf(&self) -> bool {
        self.rbf
    }

    #[inline]
    pub fn is_rbf_layer(&self, layer: usize) -> bool {
        self.rbf && layer == 1
    }

    /// Width of the RBF layer, or `None` for a plain MLP.
    #[inline]
    pub fn rbf_centers(&self) -> Option<usize> {
        self.rbf.then(|| self.sizes[1])
    }

    /// First layer touched by backpropagation.
    #[inline]
    pub fn first_trainable(&self) -> usize {
        if self.rbf { 2 } else { 1 }
    }

    /// Layers whose weights are updated by momentum SGD.
    #[inline]
    pub fn trainable_layers(&self) -> RangeInclusive<usize> {
        self.first_trainable()..=self.output_layer()
    }
}
