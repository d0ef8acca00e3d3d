//! Flat buffer layout.
//!
//! Every numeric buffer of a network is a single contiguous array. `Layout`
//! records where each layer's slice starts and how long it is:
//!
//! - `weights` / `momentums`: per destination unit, the bias weight followed by
//!   one weight per source unit. The RBF layer instead stores
//!   `mean_x, mean_y, variance` per unit.
//! - `values`: per layer, a bias slot (always `1.0`) followed by one slot per unit.
//!   The output layer's bias slot is allocated but unused.
//! - `pre_activates` / `errors`: one slot per unit for every trainable layer.
//!   The input layer and the RBF layer have no such slice.
//!
//! Slices are laid out back to back: layer `i` starts where layer `i - 1` ends.

use std::ops::Range;

use crate::Topology;

/// Number of weight slots an RBF unit uses (`mean_x`, `mean_y`, `variance`).
pub const RBF_UNIT_WEIGHTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A `(offset, len)` view into a flat buffer.
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    #[inline]
    pub fn end(self) -> usize {
        self.offset + self.len
    }

    #[inline]
    pub fn range(self) -> Range<usize> {
        self.offset..self.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The logical meaning of one entry of the flat weight buffer.
pub enum Connection {
    RbfMeanX { unit: usize },
    RbfMeanY { unit: usize },
    RbfVariance { unit: usize },
    /// Bias weight of `unit` in `layer`.
    Bias { layer: usize, unit: usize },
    /// Weight from unit `source` of `layer - 1` into `unit` of `layer`.
    Edge {
        layer: usize,
        unit: usize,
        source: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    weights: Vec<Span>,
    values: Vec<Span>,
    slots: Vec<Option<Span>>,
    weights_size: usize,
    values_size: usize,
    slots_size: usize,
}

impl Layout {
    pub fn new(topology: &Topology) -> Self {
        let sizes = topology.sizes();
        let layers = sizes.len();

        let mut weights = Vec::with_capacity(layers);
        let mut values = Vec::with_capacity(layers);
        let mut slots = Vec::with_capacity(layers);

        // The input layer owns no weights and no pre-activation/error slots.
        weights.push(Span { offset: 0, len: 0 });
        values.push(Span {
            offset: 0,
            len: sizes[0] + 1,
        });
        slots.push(None);

        let mut weights_size = 0;
        let mut values_size = sizes[0] + 1;
        let mut slots_size = 0;

        for layer in 1..layers {
            let w_len = if topology.is_rbf_layer(layer) {
                RBF_UNIT_WEIGHTS * sizes[layer]
            } else {
                (sizes[layer - 1] + 1) * sizes[layer]
            };
            weights.push(Span {
                offset: weights_size,
                len: w_len,
            });
            weights_size += w_len;

            values.push(Span {
                offset: values_size,
                len: sizes[layer] + 1,
            });
            values_size += sizes[layer] + 1;

            if topology.is_rbf_layer(layer) {
                slots.push(None);
            } else {
                slots.push(Some(Span {
                    offset: slots_size,
                    len: sizes[layer],
                }));
                slots_size += sizes[layer];
            }
        }

        Self {
            weights,
            values,
            slots,
            weights_size,
            values_size,
            slots_size,
        }
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn weights_size(&self) -> usize {
        self.weights_size
    }

    /// Momentums mirror the weight buffer one to one.
    #[inline]
    pub fn momentums_size(&self) -> usize {
        self.weights_size
    }

    #[inline]
    pub fn values_size(&self) -> usize {
        self.values_size
    }

    #[inline]
    pub fn pre_activates_size(&self) -> usize {
        self.slots_size
    }

    #[inline]
    pub fn errors_size(&self) -> usize {
        self.slots_size
    }

    #[inline]
    pub fn weights(&self, layer: usize) -> Span {
        self.weights[layer]
    }

    #[inline]
    pub fn momentums(&self, layer: usize) -> Span {
        self.weights[layer]
    }

    #[inline]
    pub fn values(&self, layer: usize) -> Span {
        self.values[layer]
    }

    /// `None` for the input layer and the RBF layer.
    #[inline]
    pub fn pre_activates(&self, layer: usize) -> Option<Span> {
        self.slots[layer]
    }

    /// `None` for the input layer and the RBF layer.
    #[inline]
    pub fn errors(&self, layer: usize) -> Option<Span> {
        self.slots[layer]
    }

    /// Index of the weight feeding `input` into `unit` of a weighted-sum layer.
    ///
    /// `input == 0` is the bias; `input == s + 1` is source unit `s`.
    #[inline]
    pub fn weight_index(&self, layer: usize, unit: usize, input: usize) -> usize {
        let fan_in = self.values[layer - 1].len;
        debug_assert!(input < fan_in);
        self.weights[layer].offset + unit * fan_in + input
    }

    /// Walk the weight buffer in storage order and name every entry.
    ///
    /// Position `w` of the returned list describes `weights[w]`.
    pub fn connections(&self, topology: &Topology) -> Vec<Connection> {
        let mut out = Vec::with_capacity(self.weights_size);
        for layer in 1..topology.num_layers() {
            for unit in 0..topology.width(layer) {
                if topology.is_rbf_layer(layer) {
                    out.push(Connection::RbfMeanX { unit });
                    out.push(Connection::RbfMeanY { unit });
                    out.push(Connection::RbfVariance { unit });
                    continue;
                }
                out.push(Connection::Bias { layer, unit });
                for source in 0..topology.width(layer - 1) {
                    out.push(Connection::Edge {
                        layer,
                        unit,
                        source,
                    });
                }
            }
        }
        debug_assert_eq!(out.len(), self.weights_size);
        out
    }
}
