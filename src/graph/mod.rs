//! Layered adjacency structures for sampled multi-hop neighborhoods.
//!
//! - `adj`: the edge set of a single hop ([`Adj`], [`AdjSize`])
//! - `batch`: a node-id sequence plus its layered adjacency ([`Batch`])
//! - `relabel`: the flat arena used to assign dense local ids

pub mod adj;
pub mod batch;
pub(crate) mod relabel;

pub use adj::{Adj, AdjSize};
pub use batch::{Batch, MiniBatch, NodeId};

#[cfg(test)]
mod tests;
