//! Edge stream → CSR construction pipeline.
//!
//! Phases, each separated by a fork-join barrier:
//! 1. endpoint validation (or vertex-count inference)
//! 2. parallel degree histogram with atomic fetch-and-add
//! 3. sequential exclusive prefix-sum into offsets
//! 4. parallel scatter through per-vertex atomic write cursors
//! 5. squish: per-vertex sort, self-loop removal, duplicate merge, and a copy
//!    into buffers from the session allocator
//!
//! Directed graphs repeat 2-5 over reversed edges to build the inverse.
//! Symmetrized graphs may then be relabeled by descending degree.

mod relabel;
mod squish;

use core::marker::PhantomData;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::alloc::{HeapAlloc, SharedAlloc};
use crate::collections::PVec;
use crate::concurrency::DisjointWriter;
use crate::error::{GraphError, Result};
use crate::graph::csr_graph::{Adjacency, CsrGraph};
use crate::graph::types::{Edge, Neighbor, NodeId};

/// What to do with parallel edges that survive symmetrization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Keep one copy; for weighted graphs the lightest one.
    #[default]
    KeepLightest,
    /// Keep one copy carrying the saturating sum of the weights.
    SumWeights,
    /// Fail the build with [`GraphError::DuplicateEdge`].
    Reject,
}

/// Builder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Insert the reverse of every edge and build an undirected view.
    pub symmetrize: bool,
    /// Build the inverse adjacency for directed graphs (needed by bottom-up BFS).
    pub invert: bool,
    /// Renumber vertices by descending degree (symmetrized graphs only).
    pub relabel: bool,
    /// Declared vertex-count upper bound; inferred from the edges when absent.
    pub num_nodes: Option<usize>,
    /// Duplicate-edge merge policy.
    pub merge_policy: MergePolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            symmetrize: false,
            invert: true,
            relabel: false,
            num_nodes: None,
            merge_policy: MergePolicy::KeepLightest,
        }
    }
}

impl BuildOptions {
    /// Options for an undirected graph.
    pub fn undirected() -> Self {
        Self {
            symmetrize: true,
            ..Self::default()
        }
    }

    /// Sets the declared vertex count.
    #[must_use]
    pub fn with_num_nodes(mut self, num_nodes: usize) -> Self {
        self.num_nodes = Some(num_nodes);
        self
    }

    /// Sets the merge policy.
    #[must_use]
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Enables relabeling by degree.
    #[must_use]
    pub fn with_relabel(mut self) -> Self {
        self.relabel = true;
        self
    }

    /// Checks option combinations.
    ///
    /// # Errors
    /// Returns [`GraphError::Config`] for unsupported combinations.
    pub fn validate(&self) -> Result<()> {
        if self.relabel && !self.symmetrize {
            return Err(GraphError::Config(
                "relabeling by degree requires a symmetrized graph".into(),
            ));
        }
        if let Some(n) = self.num_nodes {
            if n > NodeId::MAX as usize {
                return Err(GraphError::Config(format!(
                    "{n} vertices exceed the NodeId range"
                )));
            }
        }
        Ok(())
    }
}

/// Which endpoints an edge contributes to a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    /// `u -> v` into `u`'s list.
    Out,
    /// `u -> v` into `v`'s list (inverse adjacency).
    In,
    /// Both, for symmetrized graphs.
    Both,
}

impl Orientation {
    fn forward(self) -> bool {
        matches!(self, Self::Out | Self::Both)
    }

    fn reverse(self) -> bool {
        matches!(self, Self::In | Self::Both)
    }
}

/// Builds [`CsrGraph`]s from edge streams.
#[derive(Debug, Clone)]
pub struct Builder<D = NodeId> {
    options: BuildOptions,
    alloc: SharedAlloc,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Neighbor> Builder<D> {
    /// Creates a builder that places final arrays in `alloc`.
    pub fn new(alloc: SharedAlloc, options: BuildOptions) -> Self {
        Self {
            options,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Creates a builder over the heap strategy.
    pub fn with_heap(options: BuildOptions) -> Self {
        Self::new(Arc::new(HeapAlloc::new()), options)
    }

    /// Builder configuration.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Consumes an edge list and produces an immutable graph.
    ///
    /// The edge list is dropped before returning, on success and on failure.
    ///
    /// # Errors
    /// Malformed input fails with an error whose [`GraphError::is_format`] holds:
    /// - [`GraphError::VertexOutOfRange`] if an endpoint exceeds the declared count
    /// - [`GraphError::DuplicateEdge`] under [`MergePolicy::Reject`]
    /// - [`GraphError::Config`] for invalid options
    pub fn build(&self, edges: impl Into<PVec<Edge<D>>>) -> Result<CsrGraph<D>> {
        self.options.validate()?;
        let start = Instant::now();
        let edges: PVec<Edge<D>> = edges.into();
        let num_nodes = self.resolve_num_nodes(&edges)?;
        let directed = !self.options.symmetrize;

        let orientation = if directed {
            Orientation::Out
        } else {
            Orientation::Both
        };
        // Relabel copies the graph again; stage the first copy on the heap.
        let staging: SharedAlloc = if self.options.relabel {
            Arc::new(HeapAlloc::new())
        } else {
            Arc::clone(&self.alloc)
        };
        let out = self.make_adjacency(&edges, num_nodes, orientation, &staging)?;
        let inverse = if directed && self.options.invert {
            Some(self.make_adjacency(&edges, num_nodes, Orientation::In, &staging)?)
        } else {
            None
        };
        drop(edges);

        let mut graph = CsrGraph::from_parts(num_nodes, directed, out, inverse);
        tracing::info!(
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            nodes = num_nodes,
            edges = graph.num_edges(),
            "build time"
        );

        if self.options.relabel {
            let start = Instant::now();
            graph = relabel::by_degree(&graph, &self.alloc);
            tracing::info!(elapsed_ms = start.elapsed().as_secs_f64() * 1e3, "relabel time");
        }
        Ok(graph)
    }

    fn resolve_num_nodes(&self, edges: &[Edge<D>]) -> Result<usize> {
        match self.options.num_nodes {
            Some(num_nodes) => {
                let bad = edges.par_iter().find_any(|e| {
                    e.u as usize >= num_nodes || e.v.node() as usize >= num_nodes
                });
                match bad {
                    Some(e) => Err(GraphError::VertexOutOfRange {
                        src: u64::from(e.u),
                        dst: u64::from(e.v.node()),
                        num_nodes,
                    }),
                    None => Ok(num_nodes),
                }
            }
            None => {
                let max = edges.par_iter().map(|e| e.u.max(e.v.node())).max();
                match max {
                    Some(NodeId::MAX) => Err(GraphError::Format(
                        "vertex id NodeId::MAX leaves no room for a vertex count".into(),
                    )),
                    Some(m) => Ok(m as usize + 1),
                    None => Ok(0),
                }
            }
        }
    }

    fn make_adjacency(
        &self,
        edges: &[Edge<D>],
        num_nodes: usize,
        orientation: Orientation,
        alloc: &SharedAlloc,
    ) -> Result<Adjacency<D>> {
        let t = Instant::now();
        let degrees = count_degrees(edges, num_nodes, orientation);
        let offsets = prefix_sum(&degrees);
        drop(degrees);

        let cursors: Vec<AtomicU64> = offsets[..num_nodes]
            .par_iter()
            .map(|&o| AtomicU64::new(o))
            .collect();
        let total = offsets[num_nodes] as usize;
        // SAFETY: the cursors partition `0..total`; every slot is written exactly once below.
        let mut scattered = unsafe { PVec::<D>::uninit(total) };
        {
            let writer = DisjointWriter::new(&mut scattered);
            edges.par_iter().for_each(|e| {
                if orientation.forward() {
                    let slot = cursors[e.u as usize].fetch_add(1, Ordering::Relaxed);
                    // SAFETY: `slot` was handed out to this edge alone.
                    unsafe { writer.write(slot as usize, e.v) };
                }
                if orientation.reverse() {
                    let r = e.reversed();
                    let slot = cursors[r.u as usize].fetch_add(1, Ordering::Relaxed);
                    // SAFETY: as above.
                    unsafe { writer.write(slot as usize, r.v) };
                }
            });
        }
        drop(cursors);
        tracing::debug!(
            ?orientation,
            entries = total,
            elapsed_ms = t.elapsed().as_secs_f64() * 1e3,
            "scatter done"
        );

        let t = Instant::now();
        let adjacency = squish::squish(&offsets, scattered, self.options.merge_policy, alloc)?;
        tracing::debug!(
            kept = adjacency.neighbors().len(),
            dropped = total - adjacency.neighbors().len(),
            elapsed_ms = t.elapsed().as_secs_f64() * 1e3,
            "squish done"
        );
        Ok(adjacency)
    }
}

/// Parallel degree histogram.
fn count_degrees<D: Neighbor>(
    edges: &[Edge<D>],
    num_nodes: usize,
    orientation: Orientation,
) -> PVec<u64> {
    let degrees: Vec<AtomicU64> = (0..num_nodes)
        .into_par_iter()
        .map(|_| AtomicU64::new(0))
        .collect();
    edges.par_iter().for_each(|e| {
        if orientation.forward() {
            degrees[e.u as usize].fetch_add(1, Ordering::Relaxed);
        }
        if orientation.reverse() {
            degrees[e.v.node() as usize].fetch_add(1, Ordering::Relaxed);
        }
    });
    degrees.into_par_iter().map(AtomicU64::into_inner).collect()
}

/// Exclusive prefix sum with a trailing total: `n` degrees → `n + 1` offsets.
pub(crate) fn prefix_sum(degrees: &[u64]) -> PVec<u64> {
    let mut offsets = PVec::with_capacity(degrees.len() + 1);
    let mut total = 0u64;
    for &d in degrees {
        offsets.push(total);
        total += d;
    }
    offsets.push(total);
    offsets
}

/// Splits `data` into one mutable slice per vertex according to `offsets`.
pub(crate) fn split_by_offsets<'a, T>(mut data: &'a mut [T], offsets: &[u64]) -> Vec<&'a mut [T]> {
    let mut lists = Vec::with_capacity(offsets.len().saturating_sub(1));
    for w in offsets.windows(2) {
        let (head, tail) = core::mem::take(&mut data).split_at_mut((w[1] - w[0]) as usize);
        lists.push(head);
        data = tail;
    }
    lists
}
