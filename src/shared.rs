//! Continuous training on a dedicated thread.
//!
//! The trainer runs `learn()` back to back on its own thread while another
//! thread (typically the renderer) reads the weights. Weights are published
//! into an array of atomic cells with relaxed ordering and no lock: a reader
//! may observe some cells from one epoch and the rest from the next. That is
//! acceptable for visualization. Rendering may show a torn snapshot; it is
//! never unsafe, and the trainer's own state is never touched by readers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use log::info;

use crate::Trainer;

/// Lock-free, element-wise atomic copy of a weight array.
#[derive(Debug, Clone)]
pub struct SharedWeights {
    cells: Arc<[AtomicU32]>,
}

impl SharedWeights {
    pub fn new(weights: &[f32]) -> Self {
        let cells = weights
            .iter()
            .map(|w| AtomicU32::new(w.to_bits()))
            .collect::<Vec<_>>()
            .into();
        Self { cells }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Overwrite every cell. Shape contract: `weights.len() == self.len()`.
    pub fn publish(&self, weights: &[f32]) {
        assert_eq!(
            weights.len(),
            self.cells.len(),
            "publishing {} weights into {} cells",
            weights.len(),
            self.cells.len()
        );
        for (cell, w) in self.cells.iter().zip(weights) {
            cell.store(w.to_bits(), Ordering::Relaxed);
        }
    }

    /// Copy the current cells into `out` without allocating.
    pub fn snapshot_into(&self, out: &mut [f32]) {
        assert_eq!(
            out.len(),
            self.cells.len(),
            "snapshot buffer has {} slots, expected {}",
            out.len(),
            self.cells.len()
        );
        for (o, cell) in out.iter_mut().zip(self.cells.iter()) {
            *o = f32::from_bits(cell.load(Ordering::Relaxed));
        }
    }

    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.cells.len()];
        self.snapshot_into(&mut out);
        out
    }
}

/// Handle to a trainer running on its own thread.
#[derive(Debug)]
pub struct ContinuousTraining {
    weights: SharedWeights,
    epoch: Arc<AtomicU64>,
    handle: JoinHandle<Trainer>,
}

impl ContinuousTraining {
    /// Weights as last published by the training thread.
    #[inline]
    pub fn weights(&self) -> &SharedWeights {
        &self.weights
    }

    /// Epochs completed so far.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the thread to stop and take the trainer back.
    ///
    /// Without an epoch limit the thread never stops. Returns `None` if the
    /// training thread panicked.
    pub fn join(self) -> Option<Trainer> {
        self.handle.join().ok()
    }
}

/// Move `trainer` onto a new thread that calls `learn()` until `epochs`
/// invocations have run in total (forever if `None`).
///
/// After every invocation the weights are published and `on_epoch` receives
/// the epoch number and its error.
pub fn spawn_continuous<F>(mut trainer: Trainer, epochs: Option<u64>, mut on_epoch: F) -> ContinuousTraining
where
    F: FnMut(u64, f64) + Send + 'static,
{
    let weights = SharedWeights::new(trainer.network().weights());
    let epoch = Arc::new(AtomicU64::new(trainer.epoch()));

    let published = weights.clone();
    let counter = Arc::clone(&epoch);
    let handle = thread::spawn(move || {
        info!("continuous training started at epoch {}", trainer.epoch());
        while epochs.is_none_or(|limit| trainer.epoch() < limit) {
            let mse = trainer.learn();
            published.publish(trainer.network().weights());
            counter.store(trainer.epoch(), Ordering::Relaxed);
            on_epoch(trainer.epoch(), mse);
        }
        info!("continuous training stopped at epoch {}", trainer.epoch());
        trainer
    });

    ContinuousTraining {
        weights,
        epoch,
        handle,
    }
}
