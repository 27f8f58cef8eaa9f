//! An immutable CSR (compressed sparse row) graph.
//!
//! Memory layout, per direction:
//! - `offsets`: `u64` array of length `n + 1`; `offsets[u]..offsets[u + 1]`
//!   delimits the neighbors of `u`
//! - `neighbors`: flat array of destination entries (`NodeId` or `WNode`)
//!
//! Directed graphs may carry a second (inverse) pair for in-neighbors.
//! Symmetrized graphs store one pair and answer in-neighbor queries from it.
//!
//! The arrays live in [`StorageBuf`]s and go back to their allocator on drop.
//! Nothing mutates a built graph, so it is `Send + Sync` and shared by
//! reference across kernel workers without synchronization.

use core::ops::Range;

use rayon::prelude::*;

use crate::alloc::StorageBuf;
use crate::error::{GraphError, Result};
use crate::graph::types::{Neighbor, NodeId};

/// One direction of a CSR layout.
#[derive(Debug)]
pub struct Adjacency<D> {
    offsets: StorageBuf<u64>,
    neighbors: StorageBuf<D>,
}

impl<D: Neighbor> Adjacency<D> {
    /// Pairs an offsets array with its neighbor array without checks.
    pub(crate) fn from_buffers(offsets: StorageBuf<u64>, neighbors: StorageBuf<D>) -> Self {
        debug_assert_eq!(offsets.last().copied().unwrap_or(0), neighbors.len() as u64);
        Self { offsets, neighbors }
    }

    /// Checks the CSR invariants against `num_nodes`.
    ///
    /// # Errors
    /// Returns [`GraphError::Format`] describing the first violation found.
    pub fn validate(&self, num_nodes: usize) -> Result<()> {
        if self.offsets.len() != num_nodes + 1 {
            return Err(GraphError::Format(format!(
                "offsets length {} does not match {num_nodes} vertices",
                self.offsets.len()
            )));
        }
        if self.offsets[0] != 0 {
            return Err(GraphError::Format("offsets[0] must be 0".into()));
        }
        if let Some(u) = self
            .offsets
            .par_windows(2)
            .position_any(|w| w[0] > w[1])
        {
            return Err(GraphError::Format(format!(
                "offsets decrease at vertex {u}"
            )));
        }
        if self.offsets[num_nodes] != self.neighbors.len() as u64 {
            return Err(GraphError::Format(format!(
                "offsets end at {} but there are {} neighbor entries",
                self.offsets[num_nodes],
                self.neighbors.len()
            )));
        }
        if let Some(bad) = self
            .neighbors
            .par_iter()
            .find_any(|d| d.node() as usize >= num_nodes)
        {
            return Err(GraphError::Format(format!(
                "neighbor id {} out of range for {num_nodes} vertices",
                bad.node()
            )));
        }
        // `has_edge` binary-searches each list.
        if let Some(u) = (0..num_nodes).into_par_iter().find_any(|&u| {
            let list = &self.neighbors[self.offsets[u] as usize..self.offsets[u + 1] as usize];
            list.windows(2).any(|w| w[0].node() > w[1].node())
        }) {
            return Err(GraphError::Format(format!(
                "neighbor list of vertex {u} is not sorted"
            )));
        }
        Ok(())
    }

    /// Offsets array (`n + 1` entries).
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Flat neighbor array.
    pub fn neighbors(&self) -> &[D] {
        &self.neighbors
    }

    #[inline(always)]
    fn range(&self, u: NodeId) -> Range<usize> {
        let u = u as usize;
        self.offsets[u] as usize..self.offsets[u + 1] as usize
    }

    #[inline(always)]
    fn list(&self, u: NodeId) -> &[D] {
        &self.neighbors[self.range(u)]
    }

    #[inline(always)]
    fn degree(&self, u: NodeId) -> usize {
        let u = u as usize;
        (self.offsets[u + 1] - self.offsets[u]) as usize
    }
}

/// A lazy sequence of neighbor entries.
///
/// Restart by calling the accessor again (O(1)) or by cloning before consuming.
pub type Neighbors<'a, D> = core::iter::Copied<core::slice::Iter<'a, D>>;

/// An immutable CSR graph.
///
/// ### Performance Characteristics
/// | Operation | Complexity | Notes |
/// |-----------|------------|-------|
/// | `out_degree` / `in_degree` | \(O(1)\) | offset difference |
/// | `out_neighbor(u, i)` | \(O(1)\) | random access |
/// | `out_neighbors` / `in_neighbors` | \(O(1)\) | returns a lazy iterator |
/// | `in_*` on a directed graph | needs the inverse built | panics otherwise |
#[derive(Debug)]
pub struct CsrGraph<D = NodeId> {
    num_nodes: usize,
    directed: bool,
    out: Adjacency<D>,
    inverse: Option<Adjacency<D>>,
}

impl<D: Neighbor> CsrGraph<D> {
    /// Assembles a graph from already-validated parts.
    pub(crate) fn from_parts(
        num_nodes: usize,
        directed: bool,
        out: Adjacency<D>,
        inverse: Option<Adjacency<D>>,
    ) -> Self {
        debug_assert!(directed || inverse.is_none());
        Self {
            num_nodes,
            directed,
            out,
            inverse,
        }
    }

    /// Assembles a graph from raw CSR buffers, checking every invariant.
    ///
    /// # Errors
    /// Returns [`GraphError::Format`] if either direction violates the CSR invariants
    /// (including unsorted neighbor lists), if `num_nodes` exceeds the id space,
    /// or if an inverse is supplied for an undirected graph.
    pub fn from_csr_parts(
        num_nodes: usize,
        directed: bool,
        out: Adjacency<D>,
        inverse: Option<Adjacency<D>>,
    ) -> Result<Self> {
        if num_nodes > NodeId::MAX as usize {
            return Err(GraphError::Format(format!(
                "{num_nodes} vertices exceed the id space"
            )));
        }
        out.validate(num_nodes)?;
        if let Some(inv) = &inverse {
            if !directed {
                return Err(GraphError::Format(
                    "undirected graphs cannot carry a separate inverse".into(),
                ));
            }
            inv.validate(num_nodes)?;
            if inv.neighbors.len() != out.neighbors.len() {
                return Err(GraphError::Format(format!(
                    "inverse has {} edges, forward has {}",
                    inv.neighbors.len(),
                    out.neighbors.len()
                )));
            }
        }
        Ok(Self::from_parts(num_nodes, directed, out, inverse))
    }

    /// Number of vertices.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of edges: undirected edges for symmetrized graphs, arcs otherwise.
    pub fn num_edges(&self) -> usize {
        if self.directed {
            self.out.neighbors.len()
        } else {
            self.out.neighbors.len() / 2
        }
    }

    /// Number of stored neighbor entries (each undirected edge counts twice).
    pub fn num_edges_directed(&self) -> usize {
        self.out.neighbors.len()
    }

    /// Whether the graph is directed (built without symmetrization).
    pub fn directed(&self) -> bool {
        self.directed
    }

    /// Whether a separate inverse adjacency was built.
    pub fn has_inverse(&self) -> bool {
        self.inverse.is_some()
    }

    /// Whether in-neighbor queries are answerable.
    pub fn has_in_adjacency(&self) -> bool {
        !self.directed || self.inverse.is_some()
    }

    /// Whether neighbor entries carry weights.
    pub fn weighted(&self) -> bool {
        D::WEIGHTED
    }

    /// Iterates vertex ids `0..num_nodes`.
    pub fn vertices(&self) -> Range<NodeId> {
        0..self.num_nodes as NodeId
    }

    /// Out-degree of `u`.
    ///
    /// # Panics
    /// Panics if `u` is out of range.
    #[inline]
    pub fn out_degree(&self, u: NodeId) -> usize {
        self.out.degree(u)
    }

    /// In-degree of `u`.
    ///
    /// # Panics
    /// Panics if `u` is out of range or the graph is directed without an inverse.
    #[inline]
    pub fn in_degree(&self, u: NodeId) -> usize {
        self.in_adjacency().degree(u)
    }

    /// Lazy iterator over the out-neighbors of `u`.
    #[inline]
    pub fn out_neighbors(&self, u: NodeId) -> Neighbors<'_, D> {
        self.out.list(u).iter().copied()
    }

    /// Lazy iterator over the in-neighbors of `u`.
    ///
    /// # Panics
    /// Panics if the graph is directed and was built without an inverse.
    #[inline]
    pub fn in_neighbors(&self, u: NodeId) -> Neighbors<'_, D> {
        self.in_adjacency().list(u).iter().copied()
    }

    /// Out-neighbors of `u` as a slice.
    #[inline]
    pub fn out_slice(&self, u: NodeId) -> &[D] {
        self.out.list(u)
    }

    /// In-neighbors of `u` as a slice.
    #[inline]
    pub fn in_slice(&self, u: NodeId) -> &[D] {
        self.in_adjacency().list(u)
    }

    /// The `i`-th out-neighbor of `u`.
    ///
    /// # Panics
    /// Panics if `i >= out_degree(u)`.
    #[inline]
    pub fn out_neighbor(&self, u: NodeId, i: usize) -> D {
        self.out.list(u)[i]
    }

    /// Checks whether the arc `u -> v` exists (binary search; lists are sorted).
    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.out
            .list(u)
            .binary_search_by(|d| d.node().cmp(&v))
            .is_ok()
    }

    /// Forward adjacency.
    pub fn out_adjacency(&self) -> &Adjacency<D> {
        &self.out
    }

    /// Inverse adjacency, when it was built.
    pub fn inverse_adjacency(&self) -> Option<&Adjacency<D>> {
        self.inverse.as_ref()
    }

    /// Forward offsets (`n + 1` entries).
    pub fn offsets(&self) -> &[u64] {
        self.out.offsets()
    }

    /// Forward neighbor array.
    pub fn neighbors(&self) -> &[D] {
        self.out.neighbors()
    }

    /// In-direction offsets; the forward ones for symmetrized graphs.
    ///
    /// # Panics
    /// Panics if the graph is directed and was built without an inverse.
    pub fn in_offsets(&self) -> &[u64] {
        self.in_adjacency().offsets()
    }

    /// In-direction neighbor array; the forward one for symmetrized graphs.
    ///
    /// # Panics
    /// Panics if the graph is directed and was built without an inverse.
    pub fn in_neighbors_raw(&self) -> &[D] {
        self.in_adjacency().neighbors()
    }

    fn in_adjacency(&self) -> &Adjacency<D> {
        if self.directed {
            self.inverse
                .as_ref()
                .expect("directed graph was built without an inverse adjacency")
        } else {
            &self.out
        }
    }

    /// Logs vertex/edge counts and the mean degree.
    pub fn log_stats(&self) {
        let mean_degree = if self.num_nodes == 0 {
            0.0
        } else {
            self.num_edges_directed() as f64 / self.num_nodes as f64
        };
        tracing::info!(
            nodes = self.num_nodes,
            edges = self.num_edges(),
            directed = self.directed,
            weighted = D::WEIGHTED,
            inverse = self.has_inverse(),
            allocator = self.out.offsets.allocator().name(),
            mean_degree = format_args!("{mean_degree:.2}"),
            "graph stats"
        );
    }
}
