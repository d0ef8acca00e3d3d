use log::info;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::layout::RBF_UNIT_WEIGHTS;
use crate::{Activation, Cluster, Error, Layout, Result, Topology};

/// Initial weights are drawn uniformly from `[-INIT_RANGE, INIT_RANGE)`.
pub const INIT_RANGE: f32 = 0.5;

/// A network and all of its working buffers.
///
/// Every buffer is a single flat array addressed through [`Layout`]. Weights
/// are `f32` because they are shipped verbatim to the shader; everything else
/// is computed in `f64`.
#[derive(Debug, Clone)]
pub struct Network {
    topology: Topology,
    layout: Layout,
    activation: Activation,
    weights: Vec<f32>,
    momentums: Vec<f64>,
    values: Vec<f64>,
    pre_activates: Vec<f64>,
    errors: Vec<f64>,
}

/// Gaussian basis response of an RBF unit at `(x, y)`.
#[inline]
pub fn gaussian(x: f64, y: f64, mean_x: f64, mean_y: f64, variance: f64) -> f64 {
    let dx = x - mean_x;
    let dy = y - mean_y;
    (-(dx * dx + dy * dy) / (2.0 * variance)).exp()
}

impl Network {
    pub fn new_with_seed(topology: Topology, activation: Activation, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(topology, activation, &mut rng)
    }

    /// Allocate buffers and draw every weight uniformly from `[-0.5, 0.5)`.
    ///
    /// RBF centers drawn here are placeholders until
    /// [`Network::set_rbf_clusters`] installs the k-means result.
    pub fn new_with_rng<R: Rng + ?Sized>(
        topology: Topology,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let layout = Layout::new(&topology);
        let dist = Uniform::new(-INIT_RANGE, INIT_RANGE);
        let weights = (0..layout.weights_size())
            .map(|_| dist.sample(rng))
            .collect();
        Self::with_weights(topology, layout, activation, weights)
    }

    /// Build a network around an existing weight array.
    pub fn from_weights(
        topology: Topology,
        activation: Activation,
        weights: Vec<f32>,
    ) -> Result<Self> {
        let layout = Layout::new(&topology);
        if weights.len() != layout.weights_size() {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match topology weight count {}",
                weights.len(),
                layout.weights_size()
            )));
        }
        Ok(Self::with_weights(topology, layout, activation, weights))
    }

    fn with_weights(
        topology: Topology,
        layout: Layout,
        activation: Activation,
        weights: Vec<f32>,
    ) -> Self {
        let mut values = vec![0.0; layout.values_size()];
        // Bias slots are fixed for the lifetime of the network.
        for layer in 0..layout.num_layers() {
            values[layout.values(layer).offset] = 1.0;
        }

        info!(
            "network {:?}{}: {} weights, activation {}",
            topology.sizes(),
            if topology.is_rbf() { " (rbf)" } else { "" },
            layout.weights_size(),
            activation.name()
        );

        Self {
            momentums: vec![0.0; layout.momentums_size()],
            pre_activates: vec![0.0; layout.pre_activates_size()],
            errors: vec![0.0; layout.errors_size()],
            values,
            weights,
            layout,
            topology,
            activation,
        }
    }

    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// The flat weight array, in the order the shader indexes it.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    /// Weights as raw native-endian bytes, ready for a uniform-buffer upload.
    #[inline]
    pub fn weight_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.weights)
    }

    #[inline]
    pub fn momentums(&self) -> &[f64] {
        &self.momentums
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn pre_activates(&self) -> &[f64] {
        &self.pre_activates
    }

    #[inline]
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Values of `layer`, bias slot first.
    #[inline]
    pub fn layer_values(&self, layer: usize) -> &[f64] {
        &self.values[self.layout.values(layer).range()]
    }

    /// Output of the most recent forward pass.
    #[inline]
    pub fn output(&self) -> f64 {
        let out = self.layout.values(self.topology.output_layer());
        self.values[out.offset + 1]
    }

    /// Install k-means clusters as the RBF layer's weights and clear momentums.
    pub fn set_rbf_clusters(&mut self, clusters: &[Cluster]) -> Result<()> {
        let Some(k) = self.topology.rbf_centers() else {
            return Err(Error::InvalidConfig(
                "network has no rbf layer".to_owned(),
            ));
        };
        if clusters.len() != k {
            return Err(Error::InvalidConfig(format!(
                "rbf layer has {k} units, got {} clusters",
                clusters.len()
            )));
        }
        if let Some(i) = clusters.iter().position(|c| !(c.variance > 0.0)) {
            return Err(Error::InvalidData(format!(
                "cluster {i} has non-positive variance"
            )));
        }

        let span = self.layout.weights(1);
        let rbf = &mut self.weights[span.range()];
        for (unit, c) in rbf.chunks_exact_mut(RBF_UNIT_WEIGHTS).zip(clusters) {
            unit[0] = c.mean_x as f32;
            unit[1] = c.mean_y as f32;
            unit[2] = c.variance as f32;
        }
        self.momentums.fill(0.0);
        Ok(())
    }

    /// Forward pass for one input point; returns the output value.
    ///
    /// Clears pre-activations and errors, then fills `values` layer by layer.
    pub fn forward(&mut self, x: f32, y: f32) -> f64 {
        self.pre_activates.fill(0.0);
        self.errors.fill(0.0);

        let input = self.layout.values(0);
        self.values[input.offset + 1] = f64::from(x);
        self.values[input.offset + 2] = f64::from(y);

        for layer in 1..self.topology.num_layers() {
            let src = self.layout.values(layer - 1);
            let dst = self.layout.values(layer);
            let w = self.layout.weights(layer);

            // Source and destination value slices never overlap.
            let (left, right) = self.values.split_at_mut(dst.offset);
            let src_values = &left[src.range()];
            let dst_units = &mut right[1..dst.len];

            if self.topology.is_rbf_layer(layer) {
                let (px, py) = (src_values[1], src_values[2]);
                let rbf = &self.weights[w.range()];
                for (out, unit) in dst_units.iter_mut().zip(rbf.chunks_exact(RBF_UNIT_WEIGHTS)) {
                    *out = gaussian(
                        px,
                        py,
                        f64::from(unit[0]),
                        f64::from(unit[1]),
                        f64::from(unit[2]),
                    );
                }
                continue;
            }

            let slots = self
                .layout
                .pre_activates(layer)
                .expect("weighted-sum layer must own pre-activation slots");
            let pre = &mut self.pre_activates[slots.range()];
            let rows = self.weights[w.range()].chunks_exact(src.len);

            for ((out, z), row) in dst_units.iter_mut().zip(pre.iter_mut()).zip(rows) {
                for (&wi, &vi) in row.iter().zip(src_values) {
                    *z += f64::from(wi) * vi;
                }
                *out = self.activation.activate(*z);
            }
        }

        self.output()
    }

    /// Backward pass: set the output error to `target - output` and push it
    /// down through the trainable hidden layers.
    ///
    /// The propagation is linear: a hidden unit's error is the weighted sum of
    /// the next layer's errors. The activation derivative is applied later, in
    /// [`Network::update`]. Returns the output error.
    pub fn backward(&mut self, target: f64) -> f64 {
        let last = self.topology.output_layer();
        let out_slots = self
            .layout
            .errors(last)
            .expect("output layer must own error slots");
        let err = target - self.output();
        self.errors[out_slots.offset] = err;

        for layer in (self.topology.first_trainable()..last).rev() {
            let this = self
                .layout
                .errors(layer)
                .expect("trainable layer must own error slots");
            let next = self
                .layout
                .errors(layer + 1)
                .expect("trainable layer must own error slots");
            let w = self.layout.weights(layer + 1);
            let fan_in = this.len + 1;

            let (left, right) = self.errors.split_at_mut(next.offset);
            let this_errors = &mut left[this.range()];
            let next_errors = &right[..next.len];

            for (row, &e) in self.weights[w.range()].chunks_exact(fan_in).zip(next_errors) {
                // Skip the bias weight: it has no source unit.
                for (acc, &wi) in this_errors.iter_mut().zip(&row[1..]) {
                    *acc += f64::from(wi) * e;
                }
            }
        }

        err
    }

    /// Momentum SGD step over every trainable layer.
    ///
    /// For each unit, `delta = f'(z) * error * learn_rate`; each incoming
    /// connection then gets `m = delta * source + momentum * m; w += m`.
    /// RBF weights are never touched.
    pub fn update(&mut self, learn_rate: f64, momentum: f64) {
        for layer in self.topology.trainable_layers() {
            let src = self.layout.values(layer - 1);
            let w = self.layout.weights(layer);
            let slots = self
                .layout
                .errors(layer)
                .expect("trainable layer must own error slots");

            let src_values = &self.values[src.range()];
            let pre = &self.pre_activates[slots.range()];
            let errs = &self.errors[slots.range()];
            let weight_rows = self.weights[w.range()].chunks_exact_mut(src.len);
            let momentum_rows = self.momentums[w.range()].chunks_exact_mut(src.len);

            for (((w_row, m_row), &z), &e) in weight_rows.zip(momentum_rows).zip(pre).zip(errs) {
                let delta = self.activation.derive(z) * e * learn_rate;
                for ((wi, mi), &vi) in w_row.iter_mut().zip(m_row.iter_mut()).zip(src_values) {
                    *mi = delta * vi + momentum * *mi;
                    *wi = (f64::from(*wi) + *mi) as f32;
                }
            }
        }
    }

    /// Forward, backward and update for one sample; returns the output error.
    pub fn train_sample(&mut self, x: f32, y: f32, target: f64, learn_rate: f64, momentum: f64) -> f64 {
        self.forward(x, y);
        let err = self.backward(target);
        self.update(learn_rate, momentum);
        err
    }

    /// Output for `(x, y)` without disturbing the training buffers.
    ///
    /// Clones the whole network on every call. Loops over many points should
    /// clone once and call [`Network::forward`] on the copy, as
    /// `Trainer::evaluate_mse` does.
    pub fn predict(&self, x: f32, y: f32) -> f64 {
        let mut scratch = self.clone();
        scratch.forward(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(hidden: &[usize], rbf: bool, seed: u64) -> Network {
        let t = Topology::new(hidden, rbf).unwrap();
        let act = Activation::for_topology(&t);
        Network::new_with_seed(t, act, seed)
    }

    #[test]
    fn seeded_init_is_deterministic_and_bounded() {
        let a = net(&[3, 2], false, 11);
        let b = net(&[3, 2], false, 11);
        assert_eq!(a.weights(), b.weights());
        assert!(a.weights().iter().all(|w| (-0.5..0.5).contains(w)));
        assert!(a.momentums().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn bias_slots_are_one() {
        let mut n = net(&[4, 2], false, 0);
        n.forward(0.3, -0.2);
        for layer in 0..n.topology().num_layers() {
            assert_eq!(n.layer_values(layer)[0], 1.0);
        }
        assert_eq!(n.layer_values(0), &[1.0, f64::from(0.3_f32), f64::from(-0.2_f32)]);
    }

    #[test]
    fn from_weights_checks_length() {
        let t = Topology::new(&[2], false).unwrap();
        assert!(Network::from_weights(t.clone(), Activation::Tanh, vec![0.0; 8]).is_err());
        assert!(Network::from_weights(t, Activation::Tanh, vec![0.0; 9]).is_ok());
    }

    #[test]
    fn rbf_layer_computes_gaussians() {
        let mut n = net(&[2], true, 3);
        n.set_rbf_clusters(&[
            Cluster {
                mean_x: 0.0,
                mean_y: 0.0,
                variance: 0.5,
            },
            Cluster {
                mean_x: 1.0,
                mean_y: 1.0,
                variance: 2.0,
            },
        ])
        .unwrap();
        n.forward(1.0, 0.0);
        let hidden = n.layer_values(1);
        assert!((hidden[1] - (-1.0_f64).exp()).abs() < 1e-7);
        assert!((hidden[2] - (-0.25_f64).exp()).abs() < 1e-7);
    }

    #[test]
    fn update_leaves_rbf_weights_alone() {
        let mut n = net(&[3, 2], true, 5);
        let unit = Cluster {
            mean_x: 0.0,
            mean_y: 0.0,
            variance: 1.0,
        };
        n.set_rbf_clusters(&[unit; 3]).unwrap();
        let rbf = n.layout().weights(1);
        let before = n.weights()[rbf.range()].to_vec();
        let rest_before = n.weights()[rbf.end()..].to_vec();
        for _ in 0..10 {
            n.train_sample(0.4, -0.1, 1.0, 0.1, 0.9);
        }
        assert_eq!(&n.weights()[rbf.range()], before.as_slice());
        assert_ne!(&n.weights()[rbf.end()..], rest_before.as_slice());
    }

    #[test]
    fn set_rbf_clusters_rejects_mismatch() {
        let mut mlp = net(&[2], false, 0);
        assert!(mlp.set_rbf_clusters(&[]).is_err());

        let mut rbf = net(&[2], true, 0);
        let c = Cluster {
            mean_x: 0.0,
            mean_y: 0.0,
            variance: 1.0,
        };
        assert!(rbf.set_rbf_clusters(&[c]).is_err());
        let flat = Cluster { variance: 0.0, ..c };
        assert!(rbf.set_rbf_clusters(&[c, flat]).is_err());
    }

    #[test]
    fn predict_leaves_training_buffers_alone() {
        let mut n = net(&[3], false, 4);
        n.forward(0.1, 0.2);
        n.backward(1.0);
        let values = n.values().to_vec();
        let errors = n.errors().to_vec();

        let out = n.predict(-0.6, 0.9);
        assert_eq!(n.values(), values.as_slice());
        assert_eq!(n.errors(), errors.as_slice());
        assert_eq!(out, n.clone().forward(-0.6, 0.9));
    }

    #[test]
    fn backward_propagates_without_derivative() {
        // 2 -> 1 -> 1 with known weights.
        let t = Topology::new(&[1], false).unwrap();
        let weights = vec![0.0, 0.5, 0.0, 0.1, 2.0];
        let mut n = Network::from_weights(t, Activation::Tanh, weights).unwrap();
        n.forward(1.0, 0.0);
        let err = n.backward(1.0);
        assert!((err - (1.0 - n.output())).abs() < 1e-12);
        // hidden error = w(hidden -> out) * output error
        assert!((n.errors()[0] - 2.0 * err).abs() < 1e-6);
    }
}
