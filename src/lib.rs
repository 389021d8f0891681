//! # `micrognn` - Nano-batch Caching Core for Sampled GNN Training
//!
//! Training a graph neural network on sampled neighborhoods repeats work: the mini-batch
//! is split into smaller *nano-batches* that fit the accelerator, and neighborhoods of
//! nearby targets overlap, so the same intermediate embeddings get computed again and
//! again. This crate provides the bookkeeping that removes that redundancy.
//!
//! ## Components
//!
//! - **[`Partitioner`]**: splits a layered [`MiniBatch`] into nano-batches, each a
//!   self-consistent relabeled neighborhood that still carries global node ids.
//! - **[`History`]**: per-layer embedding cache keyed by global node id, valid for the
//!   lifetime of one mini-batch. Storage holds one row per node of the mini-batch,
//!   however large its global ids are.
//! - **[`prune_computation_graph`]**: drops every edge whose destination is already
//!   cached, so the convolution only computes what is new.
//! - **[`OverlapAnalyzer`]**: measures how much of each layer an earlier nano-batch
//!   already produced, under a fixed order or over all permutations.
//! - **[`pipeline`]**: drives an external [`LayerOperator`] over the nano-batches of a
//!   mini-batch with pull/push against the caches.
//!
//! ## Data Model
//!
//! A layered adjacency is a list of bipartite [`Adj`] blocks, **outer hop first**.
//! Block `i` has size `(src, dst)`; its destinations are a prefix of its sources, and
//! block `i + 1` draws its sources from the destinations of block `i`. The innermost
//! block's destinations are the targets. Local ids index into the batch's `n_id`
//! sequence, which holds global ids.
//!
//! ```
//! use micrognn::{prune_computation_graph, Adj, Batch, History};
//!
//! let nb = Batch::new(
//!     vec![0, 1, 2, 3, 4],
//!     1,
//!     vec![
//!         Adj::new([(1, 0), (2, 0), (3, 1), (4, 2)], (5, 3)),
//!         Adj::new([(1, 0), (2, 0)], (3, 1)),
//!     ],
//! )
//! .unwrap();
//!
//! // Node 2 was computed by an earlier nano-batch.
//! let mut history = History::new(0..5, 4).unwrap();
//! history.push(&micrognn::Embeddings::zeros(1, 4), &[2]).unwrap();
//!
//! let pruned = prune_computation_graph(&nb, &[history]).unwrap();
//! assert_eq!(pruned[0].edge_pairs(), vec![(1, 0), (2, 0), (3, 1)]);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` (default): exhaustive overlap analysis and independent mini-batches run on
//!   rayon's thread pool.
//!
//! ## Logging
//!
//! All components emit [`tracing`] events (`debug` per mini-batch or nano-batch, `trace`
//! per cache operation, `warn` for truncated targets). Install any subscriber to see them.

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod history;
pub mod partition;
pub mod pipeline;
pub mod prune;

pub use analysis::{
    LayerNodeSource, LayerOverlap, MiniBatchOverlap, OverlapAccumulator, OverlapAnalyzer,
    OverlapReport,
};
pub use config::{
    AnalyzerConfig, NanoBatchOrder, OverlapMode, PartitionConfig, RemainderPolicy, RunConfig,
};
pub use error::{
    CacheConsistencyError, Component, ConfigurationError, Error, Result, StructuralViolation,
};
pub use graph::{Adj, AdjSize, Batch, MiniBatch, NodeId};
pub use history::{Embeddings, History, HistoryStack, NodeSlots, PresenceBits};
pub use partition::{LayerNodes, NanoBatch, Partitioner};
pub use pipeline::{
    run_mini_batch, run_mini_batches, LayerOperator, MeanAggregator, NanoBatchExecutor,
};
pub use prune::{prune_computation_graph, prune_layer};

// Compile-time layout checks.
const _: () = {
    use core::mem;

    // A size is exactly two counts.
    assert!(mem::size_of::<AdjSize>() == 2 * mem::size_of::<usize>());

    // Config enums stay small enough to copy around freely.
    assert!(mem::size_of::<RemainderPolicy>() == 1);
    assert!(mem::size_of::<OverlapMode>() == 1);
};
