//! Typed failures for every component of the crate.
//!
//! Errors fall into three families:
//! - [`StructuralViolation`]: a layered adjacency breaks the prefix or layer-composition
//!   invariants. Always fatal to the enclosing mini-batch.
//! - [`ConfigurationError`]: an invalid partition count, remainder policy or history layout.
//! - [`CacheConsistencyError`]: an id or buffer that does not fit a [`History`](crate::History).
//!
//! Every variant of [`Error`] carries the [`Component`] that detected it. None of them are
//! retried internally; recovery (skipping or re-sampling the mini-batch) belongs to the caller.

use core::fmt;

/// Convenient alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// The component that reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Structure validation of a [`Batch`](crate::Batch).
    Graph,
    /// Nano-batch partitioning.
    Partitioner,
    /// The embedding history cache.
    History,
    /// Computation-graph pruning.
    Pruner,
    /// Overlap analysis.
    Analyzer,
    /// The nano-batch executor.
    Executor,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Graph => "graph",
            Self::Partitioner => "partitioner",
            Self::History => "history",
            Self::Pruner => "pruner",
            Self::Analyzer => "analyzer",
            Self::Executor => "executor",
        };
        f.write_str(name)
    }
}

/// The crate's error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A malformed layered adjacency or feature buffer.
    #[error("{component}: structural violation: {violation}")]
    Structural {
        /// Reporting component.
        component: Component,
        /// The broken invariant.
        violation: StructuralViolation,
    },
    /// An invalid configuration.
    #[error("{component}: configuration error: {problem}")]
    Configuration {
        /// Reporting component.
        component: Component,
        /// What is wrong with the configuration.
        problem: ConfigurationError,
    },
    /// An id or buffer that does not fit a history cache.
    #[error("{component}: cache consistency error: {problem}")]
    CacheConsistency {
        /// Reporting component.
        component: Component,
        /// What does not fit.
        problem: CacheConsistencyError,
    },
    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// A configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn structural(component: Component, violation: StructuralViolation) -> Self {
        Self::Structural {
            component,
            violation,
        }
    }

    pub(crate) fn configuration(component: Component, problem: ConfigurationError) -> Self {
        Self::Configuration { component, problem }
    }

    pub(crate) fn cache(component: Component, problem: CacheConsistencyError) -> Self {
        Self::CacheConsistency { component, problem }
    }

    /// Returns the component that reported this error, if any.
    pub fn component(&self) -> Option<Component> {
        match self {
            Self::Structural { component, .. }
            | Self::Configuration { component, .. }
            | Self::CacheConsistency { component, .. } => Some(*component),
            Self::ConfigParse(_) | Self::ConfigIo(_) => None,
        }
    }
}

/// A broken invariant of a layered adjacency or feature buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralViolation {
    /// The layered adjacency has no layers.
    #[error("layered adjacency has no layers")]
    NoLayers,
    /// An edge destination is not below the layer's destination count.
    #[error("layer {layer} edge {edge}: destination {dst} >= dst count {dst_count}")]
    DestinationOutOfRange {
        /// Layer index.
        layer: usize,
        /// Edge position within the layer.
        edge: usize,
        /// Offending destination local id.
        dst: usize,
        /// Destination count of the layer.
        dst_count: usize,
    },
    /// An edge source is not below the layer's source count.
    #[error("layer {layer} edge {edge}: source {src} >= src count {src_count}")]
    SourceOutOfRange {
        /// Layer index.
        layer: usize,
        /// Edge position within the layer.
        edge: usize,
        /// Offending source local id.
        src: usize,
        /// Source count of the layer.
        src_count: usize,
    },
    /// The destination set is larger than the source set it must prefix.
    #[error("layer {layer}: dst count {dst_count} exceeds src count {src_count}")]
    TargetsNotPrefix {
        /// Layer index.
        layer: usize,
        /// Destination count.
        dst_count: usize,
        /// Source count.
        src_count: usize,
    },
    /// A layer's source space is not contained in the previous layer's destination space.
    #[error("layer {layer}: src count {src_count} exceeds outer dst count {outer_dst_count}")]
    LayerComposition {
        /// Inner layer index.
        layer: usize,
        /// Source count of the inner layer.
        src_count: usize,
        /// Destination count of the outer layer.
        outer_dst_count: usize,
    },
    /// The outermost source space is larger than the node-id sequence.
    #[error("layer {layer}: src count {src_count} exceeds node count {node_count}")]
    SourceSpaceExceedsNodes {
        /// Layer index.
        layer: usize,
        /// Source count.
        src_count: usize,
        /// Length of the node-id sequence.
        node_count: usize,
    },
    /// The innermost destination count disagrees with the target count.
    #[error("innermost dst count {dst_count} does not match target count {target_count}")]
    TargetCountMismatch {
        /// Innermost destination count.
        dst_count: usize,
        /// Declared target count.
        target_count: usize,
    },
    /// Per-edge ids do not line up with the edges.
    #[error("layer {layer}: {ids} edge ids for {edges} edges")]
    EdgeIdCount {
        /// Layer index.
        layer: usize,
        /// Number of per-edge ids.
        ids: usize,
        /// Number of edges.
        edges: usize,
    },
    /// A local id has no entry in the node-id sequence.
    #[error("local id {local} is outside a node-id sequence of length {node_count}")]
    LocalIdOutOfRange {
        /// Offending local id.
        local: usize,
        /// Length of the node-id sequence.
        node_count: usize,
    },
    /// A feature buffer has the wrong number of rows.
    #[error("feature buffer has {rows} rows, expected {expected}")]
    FeatureRows {
        /// Rows present.
        rows: usize,
        /// Rows expected.
        expected: usize,
    },
    /// Source and destination columns of an edge set differ in length.
    #[error("{sources} source ids for {targets} destination ids")]
    ColumnLengths {
        /// Length of the source column.
        sources: usize,
        /// Length of the destination column.
        targets: usize,
    },
    /// A linear buffer does not hold `rows x dim` values.
    #[error("buffer of {len} values cannot be shaped {rows} x {dim}")]
    BufferShape {
        /// Values supplied.
        len: usize,
        /// Requested rows.
        rows: usize,
        /// Requested width.
        dim: usize,
    },
    /// A nano-batch sequence mixes different layer counts.
    #[error("nano-batch {index} has {layers} layers, expected {expected}")]
    LayerCountMismatch {
        /// Position of the offending nano-batch.
        index: usize,
        /// Its layer count.
        layers: usize,
        /// Layer count of the first nano-batch.
        expected: usize,
    },
}

/// An invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// A partition into zero nano-batches was requested.
    #[error("nano-batch count must be positive")]
    ZeroNanoBatches,
    /// More nano-batches than targets were requested.
    #[error("{nano_batches} nano-batches requested for {targets} targets")]
    TooManyNanoBatches {
        /// Requested nano-batch count.
        nano_batches: usize,
        /// Number of targets available.
        targets: usize,
    },
    /// Uneven division with the strict remainder policy.
    #[error("{targets} targets do not divide into {nano_batches} nano-batches")]
    UnevenTargets {
        /// Number of targets.
        targets: usize,
        /// Requested nano-batch count.
        nano_batches: usize,
    },
    /// More histories than non-terminal layers.
    #[error("{histories} histories for {layers} non-terminal layers")]
    TooManyHistories {
        /// Number of histories supplied.
        histories: usize,
        /// Number of non-terminal layers.
        layers: usize,
    },
    /// Hidden dimensions do not cover every intermediate layer.
    #[error("{dims} hidden dimensions for {layers} intermediate layers")]
    HiddenDims {
        /// Number of dimensions supplied.
        dims: usize,
        /// Number of intermediate layers.
        layers: usize,
    },
    /// No nano-batches were supplied to the analyzer.
    #[error("no nano-batches to analyze")]
    EmptyNanoBatchSet,
    /// Exhaustive analysis over too many nano-batches.
    #[error("exhaustive analysis of {nano_batches} nano-batches exceeds the limit of {limit}")]
    ExhaustiveLimit {
        /// Number of nano-batches.
        nano_batches: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// An id or buffer that does not fit a history cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheConsistencyError {
    /// A global id has no slot in the history, because its mini-batch does not hold it.
    #[error("node {node} has no slot in a history of {capacity} nodes")]
    UnknownNode {
        /// Offending global id.
        node: usize,
        /// Number of nodes the history covers.
        capacity: usize,
    },
    /// The history's storage size does not fit in `usize`.
    #[error("{nodes} nodes of width {dim} overflow the storage size")]
    StorageOverflow {
        /// Number of nodes to cover.
        nodes: usize,
        /// Embedding width.
        dim: usize,
    },
    /// A feature buffer's row width differs from the history's embedding width.
    #[error("feature dimension {got} does not match history dimension {expected}")]
    DimensionMismatch {
        /// Width of the offered rows.
        got: usize,
        /// Width stored by the history.
        expected: usize,
    },
}
