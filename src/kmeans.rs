//! K-means seeding for RBF centers.
//!
//! The RBF layer is not trained by backpropagation. Its centers and widths
//! come from a k-means pass over the training inputs, run once before the
//! first epoch:
//!
//! 1. shuffle the dataset and take the first `k` samples as initial centers,
//! 2. assign every sample to its nearest center (first minimum wins ties),
//!    recompute each center as the mean of its samples, and repeat until the
//!    assignment no longer changes,
//! 3. set each variance to the mean squared distance of its samples to the
//!    center, plus [`VARIANCE_SMOOTHING`].
//!
//! The loop runs to a fixed point unless a cap is configured with
//! [`KMeans::with_max_iterations`].

use log::{debug, info};
use rand::Rng;

use crate::{Dataset, Error, Result, Sample};

/// Added to every fitted variance so the Gaussian never collapses to a spike.
pub const VARIANCE_SMOOTHING: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
/// One RBF unit: a center and the variance of its Gaussian.
pub struct Cluster {
    pub mean_x: f64,
    pub mean_y: f64,
    pub variance: f64,
}

impl Cluster {
    #[inline]
    fn distance_sq(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.mean_x;
        let dy = y - self.mean_y;
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeans {
    k: usize,
    max_iterations: Option<usize>,
}

impl KMeans {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig("k-means needs k > 0".to_owned()));
        }
        Ok(Self {
            k,
            max_iterations: None,
        })
    }

    /// Give up with [`Error::NotConverged`] if assignments still move after `n`
    /// center updates.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Shuffle `data`, seed from its first `k` samples, and run to convergence.
    pub fn fit<R: Rng + ?Sized>(&self, data: &mut Dataset, rng: &mut R) -> Result<Vec<Cluster>> {
        if data.len() < self.k {
            return Err(Error::InvalidConfig(format!(
                "k-means needs at least {} samples, dataset has {}",
                self.k,
                data.len()
            )));
        }

        data.shuffle(rng);
        let seeds = (0..self.k)
            .map(|pos| {
                let s = data.shuffled(pos);
                Cluster {
                    mean_x: f64::from(s.x),
                    mean_y: f64::from(s.y),
                    variance: 0.0,
                }
            })
            .collect();

        self.fit_from(data.samples(), seeds)
    }

    /// Run to convergence from explicit starting centers.
    pub fn fit_from(&self, samples: &[Sample], mut clusters: Vec<Cluster>) -> Result<Vec<Cluster>> {
        if clusters.len() != self.k {
            return Err(Error::InvalidConfig(format!(
                "expected {} starting centers, got {}",
                self.k,
                clusters.len()
            )));
        }

        let mut assignment = vec![usize::MAX; samples.len()];
        let mut iterations = 0;
        loop {
            let changed = assign_into(samples, &clusters, &mut assignment);
            debug!("k-means pass {iterations}: {changed} reassigned");
            if changed == 0 {
                break;
            }
            if let Some(cap) = self.max_iterations {
                if iterations >= cap {
                    return Err(Error::NotConverged { iterations });
                }
            }
            recenter(samples, &assignment, &mut clusters)?;
            iterations += 1;
        }

        fit_variances(samples, &assignment, &mut clusters)?;
        info!("k-means converged after {iterations} updates, k={}", self.k);
        Ok(clusters)
    }
}

/// Index of the nearest cluster. Ties keep the lowest index.
pub fn nearest(clusters: &[Cluster], x: f64, y: f64) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in clusters.iter().enumerate() {
        let d = c.distance_sq(x, y);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

/// Nearest cluster for every sample, in sample order.
pub fn assign(samples: &[Sample], clusters: &[Cluster]) -> Vec<usize> {
    samples
        .iter()
        .map(|s| nearest(clusters, f64::from(s.x), f64::from(s.y)))
        .collect()
}

fn assign_into(samples: &[Sample], clusters: &[Cluster], assignment: &mut [usize]) -> usize {
    let mut changed = 0;
    for (s, slot) in samples.iter().zip(assignment.iter_mut()) {
        let c = nearest(clusters, f64::from(s.x), f64::from(s.y));
        if *slot != c {
            *slot = c;
            changed += 1;
        }
    }
    changed
}

fn recenter(samples: &[Sample], assignment: &[usize], clusters: &mut [Cluster]) -> Result<()> {
    let mut sums = vec![(0.0_f64, 0.0_f64, 0_usize); clusters.len()];
    for (s, &c) in samples.iter().zip(assignment) {
        let acc = &mut sums[c];
        acc.0 += f64::from(s.x);
        acc.1 += f64::from(s.y);
        acc.2 += 1;
    }
    for (cluster, (i, &(sx, sy, n))) in clusters.iter_mut().zip(sums.iter().enumerate()) {
        if n == 0 {
            return Err(Error::EmptyCluster { cluster: i });
        }
        cluster.mean_x = sx / n as f64;
        cluster.mean_y = sy / n as f64;
    }
    Ok(())
}

fn fit_variances(samples: &[Sample], assignment: &[usize], clusters: &mut [Cluster]) -> Result<()> {
    let mut sums = vec![(0.0_f64, 0_usize); clusters.len()];
    for (s, &c) in samples.iter().zip(assignment) {
        let d = clusters[c].distance_sq(f64::from(s.x), f64::from(s.y));
        sums[c].0 += d;
        sums[c].1 += 1;
    }
    for (i, (cluster, &(sd, n))) in clusters.iter_mut().zip(&sums).enumerate() {
        if n == 0 {
            return Err(Error::EmptyCluster { cluster: i });
        }
        cluster.variance = sd / n as f64 + VARIANCE_SMOOTHING;
    }
    Ok(())
}
