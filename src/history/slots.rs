//! Global-id to row-slot table of one mini-batch.
//!
//! Global ids come from the whole graph and can be arbitrarily large, so a cache never
//! indexes its storage by them directly. Each id the mini-batch holds gets a dense slot in
//! first-seen order and the caches of every layer share one table.

use std::collections::HashMap;

use crate::graph::NodeId;

/// Dense slots for the global ids of one mini-batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeSlots {
    slots: HashMap<NodeId, usize>,
    nodes: Vec<NodeId>,
}

impl NodeSlots {
    /// Assigns slots to `nodes` in first-seen order. A repeated id keeps its first slot.
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let nodes = nodes.into_iter();
        let hint = nodes.size_hint().0;
        let mut slots = HashMap::with_capacity(hint);
        let mut order = Vec::with_capacity(hint);
        for node in nodes {
            let next = order.len();
            slots.entry(node).or_insert_with(|| {
                order.push(node);
                next
            });
        }
        Self {
            slots,
            nodes: order,
        }
    }

    /// Number of distinct ids.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no id has a slot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Slot of `node`, if the mini-batch holds it.
    #[inline]
    pub fn slot(&self, node: NodeId) -> Option<usize> {
        self.slots.get(&node).copied()
    }

    /// Global ids in slot order.
    #[inline]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}
