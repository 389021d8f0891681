//! Aggregation of overlap ratios across mini-batches.

use serde::Serialize;

use crate::config::OverlapMode;
use crate::error::{Component, Error, Result, StructuralViolation};

use super::MiniBatchOverlap;

/// Mean and population standard deviation of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    /// Sample size.
    pub count: usize,
    /// Arithmetic mean (0 for an empty sample).
    pub mean: f64,
    /// Population standard deviation (0 for an empty sample).
    pub std: f64,
}

impl Summary {
    /// Summarizes `values`.
    #[allow(clippy::cast_precision_loss)]
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            count: values.len(),
            mean,
            std: var.sqrt(),
        }
    }
}

/// Aggregated ratios of one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerReport {
    /// Layer index, outer hop first.
    pub layer: usize,
    /// Redundant ratio of the analyzed order.
    pub given: Summary,
    /// Smallest ratio over all orders (exhaustive mode only).
    pub min: Option<Summary>,
    /// Largest ratio over all orders (exhaustive mode only).
    pub max: Option<Summary>,
}

/// Per-layer overlap statistics over many mini-batches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapReport {
    /// Mode the ratios were computed in.
    pub mode: OverlapMode,
    /// Number of mini-batches recorded.
    pub mini_batches: usize,
    /// One entry per layer.
    pub layers: Vec<LayerReport>,
}

impl OverlapReport {
    /// Emits one `info` event per layer.
    pub fn log(&self, label: &str) {
        for l in &self.layers {
            match (&l.min, &l.max) {
                (Some(min), Some(max)) => tracing::info!(
                    label,
                    layer = l.layer,
                    mini_batches = self.mini_batches,
                    given_mean = l.given.mean,
                    min_mean = min.mean,
                    max_mean = max.mean,
                    max_std = max.std,
                    "overlap"
                ),
                _ => tracing::info!(
                    label,
                    layer = l.layer,
                    mini_batches = self.mini_batches,
                    mean = l.given.mean,
                    std = l.given.std,
                    "overlap"
                ),
            }
        }
    }
}

/// Collects per-mini-batch overlap results.
#[derive(Debug, Clone)]
pub struct OverlapAccumulator {
    mode: OverlapMode,
    given: Vec<Vec<f64>>,
    min: Vec<Vec<f64>>,
    max: Vec<Vec<f64>>,
    mini_batches: usize,
}

impl OverlapAccumulator {
    /// Creates an empty accumulator.
    pub fn new(mode: OverlapMode) -> Self {
        Self {
            mode,
            given: Vec::new(),
            min: Vec::new(),
            max: Vec::new(),
            mini_batches: 0,
        }
    }

    /// Number of mini-batches recorded so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.mini_batches
    }

    /// Returns `true` if nothing was recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mini_batches == 0
    }

    /// Records one mini-batch.
    ///
    /// # Errors
    /// Fails if its layer count differs from the mini-batches recorded before.
    pub fn record(&mut self, overlap: &MiniBatchOverlap) -> Result<()> {
        let layers = overlap.layers.len();
        if self.mini_batches == 0 {
            self.given = vec![Vec::new(); layers];
            self.min = vec![Vec::new(); layers];
            self.max = vec![Vec::new(); layers];
        } else if layers != self.given.len() {
            return Err(Error::structural(
                Component::Analyzer,
                StructuralViolation::LayerCountMismatch {
                    index: self.mini_batches,
                    layers,
                    expected: self.given.len(),
                },
            ));
        }

        for (i, l) in overlap.layers.iter().enumerate() {
            self.given[i].push(l.ratio());
            self.min[i].push(l.min_ratio());
            self.max[i].push(l.max_ratio());
        }
        self.mini_batches += 1;
        Ok(())
    }

    /// Summarizes everything recorded.
    pub fn report(&self) -> OverlapReport {
        let exhaustive = self.mode == OverlapMode::Exhaustive;
        let layers = (0..self.given.len())
            .map(|layer| LayerReport {
                layer,
                given: Summary::of(&self.given[layer]),
                min: exhaustive.then(|| Summary::of(&self.min[layer])),
                max: exhaustive.then(|| Summary::of(&self.max[layer])),
            })
            .collect();
        OverlapReport {
            mode: self.mode,
            mini_batches: self.mini_batches,
            layers,
        }
    }
}
