//! Serde-backed configuration.
//!
//! Seeds and orderings are part of the configuration; nothing in the crate reads ambient
//! random state. Every struct uses `#[serde(default)]`, so a JSON document only needs the
//! fields it overrides:
//!
//! ```
//! use micrognn::{NanoBatchOrder, OverlapMode, RunConfig};
//!
//! let cfg = RunConfig::from_json_str(
//!     r#"{ "partition": { "num_nano_batches": 4, "order": { "shuffled": { "seed": 7 } } },
//!          "analyzer": { "mode": "exhaustive" } }"#,
//! )
//! .unwrap();
//! assert_eq!(cfg.partition.num_nano_batches, 4);
//! assert_eq!(cfg.partition.order, NanoBatchOrder::Shuffled { seed: 7 });
//! assert_eq!(cfg.analyzer.mode, OverlapMode::Exhaustive);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How targets are split when the nano-batch count does not divide the target count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// The last nano-batch takes the leftover targets.
    #[default]
    LastAbsorbs,
    /// Leftover targets are dropped.
    Truncate,
    /// Uneven division is a configuration error.
    Strict,
}

/// Order in which a nano-batch sequence is emitted or analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanoBatchOrder {
    /// Chunk order.
    #[default]
    Given,
    /// A seeded permutation of chunk order.
    Shuffled {
        /// Seed for the permutation.
        seed: u64,
    },
}

/// Overlap analysis mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapMode {
    /// Only the order in which the nano-batches are supplied.
    #[default]
    Fixed,
    /// Every permutation, tracking the best and worst case.
    Exhaustive,
}

/// Configuration of the [`Partitioner`](crate::Partitioner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Number of nano-batches per mini-batch.
    pub num_nano_batches: usize,
    /// Handling of targets left over by uneven division.
    pub remainder: RemainderPolicy,
    /// Emission order of the nano-batches.
    pub order: NanoBatchOrder,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            num_nano_batches: 2,
            remainder: RemainderPolicy::default(),
            order: NanoBatchOrder::default(),
        }
    }
}

impl PartitionConfig {
    /// Configuration splitting each mini-batch into `num_nano_batches` nano-batches.
    pub fn new(num_nano_batches: usize) -> Self {
        Self {
            num_nano_batches,
            ..Self::default()
        }
    }

    /// Configuration with `per_worker` nano-batches for each of `workers` workers.
    pub fn for_workers(workers: usize, per_worker: usize) -> Self {
        Self::new(workers * per_worker)
    }

    /// Sets the remainder policy.
    #[must_use]
    pub fn with_remainder(mut self, remainder: RemainderPolicy) -> Self {
        self.remainder = remainder;
        self
    }

    /// Sets the emission order.
    #[must_use]
    pub fn with_order(mut self, order: NanoBatchOrder) -> Self {
        self.order = order;
        self
    }
}

/// Configuration of the [`OverlapAnalyzer`](crate::OverlapAnalyzer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Fixed or exhaustive ordering.
    pub mode: OverlapMode,
    /// Order applied to the supplied sequence before fixed-order analysis.
    pub order: NanoBatchOrder,
    /// Largest nano-batch count accepted in exhaustive mode.
    pub max_exhaustive: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            mode: OverlapMode::default(),
            order: NanoBatchOrder::default(),
            max_exhaustive: 8,
        }
    }
}

impl AnalyzerConfig {
    /// Configuration for the given mode with default limits.
    pub fn new(mode: OverlapMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Partitioning.
    pub partition: PartitionConfig,
    /// Overlap analysis.
    pub analyzer: AnalyzerConfig,
    /// Embedding width of each intermediate layer.
    pub hidden_dims: Vec<usize>,
}

impl RunConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    /// Returns [`Error::ConfigParse`](crate::Error::ConfigParse) on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    /// Returns [`Error::ConfigIo`](crate::Error::ConfigIo) if the file cannot be read and
    /// [`Error::ConfigParse`](crate::Error::ConfigParse) if it is malformed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
