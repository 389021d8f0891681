//! The edge set of one hop of a sampled neighborhood.
//!
//! Edges are stored as a structure of arrays (`sources`, `targets`) so that filtering
//! passes touch two contiguous `usize` vectors instead of a vector of pairs.
//!
//! Direction follows message passing: the source is the node farther from the root,
//! the destination the node nearer to it. Destinations index the prefix of the
//! enclosing batch's node-id sequence.

use crate::error::StructuralViolation;

/// The `(src_count, dst_count)` pair of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AdjSize {
    /// Number of source-side nodes valid at this layer.
    pub src: usize,
    /// Number of destination-side (target) nodes at this layer.
    pub dst: usize,
}

impl AdjSize {
    /// Creates a size pair.
    #[inline]
    pub const fn new(src: usize, dst: usize) -> Self {
        Self { src, dst }
    }
}

impl From<(usize, usize)> for AdjSize {
    fn from((src, dst): (usize, usize)) -> Self {
        Self { src, dst }
    }
}

/// Edge set of one layer.
///
/// | Operation | Complexity |
/// |-----------|------------|
/// | `new` | \(O(m)\) |
/// | `edges` | \(O(1)\) per edge |
/// | `filtered` | \(O(m)\) |
/// | `validate` | \(O(m)\) |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adj {
    sources: Vec<usize>,
    targets: Vec<usize>,
    edge_ids: Option<Vec<u64>>,
    size: AdjSize,
}

impl Adj {
    /// Builds an edge set from `(src, dst)` pairs.
    ///
    /// No range checks are performed; call [`Adj::validate`] (or validate the enclosing
    /// [`Batch`](crate::Batch)) before relying on the invariants.
    pub fn new(edges: impl IntoIterator<Item = (usize, usize)>, size: impl Into<AdjSize>) -> Self {
        let (sources, targets) = edges.into_iter().unzip();
        Self {
            sources,
            targets,
            edge_ids: None,
            size: size.into(),
        }
    }

    /// Builds an edge set directly from its source and destination columns.
    ///
    /// As with [`Adj::new`], ids are not range-checked here.
    ///
    /// # Errors
    /// Returns [`StructuralViolation::ColumnLengths`] if the two columns differ in length.
    pub fn from_columns(
        sources: Vec<usize>,
        targets: Vec<usize>,
        size: impl Into<AdjSize>,
    ) -> Result<Self, StructuralViolation> {
        if sources.len() != targets.len() {
            return Err(StructuralViolation::ColumnLengths {
                sources: sources.len(),
                targets: targets.len(),
            });
        }
        Ok(Self {
            sources,
            targets,
            edge_ids: None,
            size: size.into(),
        })
    }

    /// Attaches opaque per-edge ids. They are carried through filtering unchanged.
    #[must_use]
    pub fn with_edge_ids(mut self, ids: Vec<u64>) -> Self {
        self.edge_ids = Some(ids);
        self
    }

    /// Size metadata of the layer.
    #[inline]
    pub fn size(&self) -> AdjSize {
        self.size
    }

    /// Number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if the layer has no edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source column.
    #[inline]
    pub fn sources(&self) -> &[usize] {
        &self.sources
    }

    /// Destination column.
    #[inline]
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Per-edge ids, if any.
    #[inline]
    pub fn edge_ids(&self) -> Option<&[u64]> {
        self.edge_ids.as_deref()
    }

    /// Iterates `(src, dst)` pairs in stored order.
    pub fn edges(&self) -> impl ExactSizeIterator<Item = (usize, usize)> + '_ {
        self.sources.iter().copied().zip(self.targets.iter().copied())
    }

    /// Collects the edges into `(src, dst)` pairs.
    pub fn edge_pairs(&self) -> Vec<(usize, usize)> {
        self.edges().collect()
    }

    /// Returns a copy holding only the edges for which `keep(src, dst)` is `true`.
    ///
    /// Relative order, per-edge ids and size metadata are preserved.
    pub fn filtered(&self, mut keep: impl FnMut(usize, usize) -> bool) -> Self {
        let mut sources = Vec::with_capacity(self.sources.len());
        let mut targets = Vec::with_capacity(self.targets.len());
        let mut ids = self.edge_ids.as_ref().map(|ids| Vec::with_capacity(ids.len()));

        for (i, (src, dst)) in self.edges().enumerate() {
            if keep(src, dst) {
                sources.push(src);
                targets.push(dst);
                if let (Some(out), Some(all)) = (ids.as_mut(), self.edge_ids.as_ref()) {
                    out.push(all[i]);
                }
            }
        }

        Self {
            sources,
            targets,
            edge_ids: ids,
            size: self.size,
        }
    }

    /// Checks the per-layer invariants: every edge in range and the destination set a
    /// prefix of the source set.
    pub fn validate(&self, layer: usize) -> Result<(), StructuralViolation> {
        let AdjSize { src: src_count, dst: dst_count } = self.size;
        if dst_count > src_count {
            return Err(StructuralViolation::TargetsNotPrefix {
                layer,
                dst_count,
                src_count,
            });
        }
        if let Some(ids) = &self.edge_ids {
            if ids.len() != self.sources.len() {
                return Err(StructuralViolation::EdgeIdCount {
                    layer,
                    ids: ids.len(),
                    edges: self.sources.len(),
                });
            }
        }
        for (edge, (src, dst)) in self.edges().enumerate() {
            if dst >= dst_count {
                return Err(StructuralViolation::DestinationOutOfRange {
                    layer,
                    edge,
                    dst,
                    dst_count,
                });
            }
            if src >= src_count {
                return Err(StructuralViolation::SourceOutOfRange {
                    layer,
                    edge,
                    src,
                    src_count,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn from_parts(
        sources: Vec<usize>,
        targets: Vec<usize>,
        edge_ids: Option<Vec<u64>>,
        size: AdjSize,
    ) -> Self {
        debug_assert_eq!(sources.len(), targets.len());
        Self {
            sources,
            targets,
            edge_ids,
            size,
        }
    }
}
