//! Graph representation, construction and persistence.
//!
//! - `types`: vertex, weight and edge types
//! - `csr_graph`: the immutable CSR graph
//! - `builder`: parallel edge-list → CSR construction
//! - `io`: the flat on-disk layout

pub mod builder;
pub mod csr_graph;
pub mod io;
pub mod types;

pub use builder::{BuildOptions, Builder, MergePolicy};
pub use csr_graph::{Adjacency, CsrGraph, Neighbors};
pub use types::{Edge, Neighbor, NodeId, WNode, Weight};

/// Unweighted graph.
pub type Graph = CsrGraph<NodeId>;
/// Weighted graph.
pub type WGraph = CsrGraph<WNode>;
