//! # `gapgraph` - Shared-Memory Graph Benchmark Kernels
//!
//! A CSR (compressed sparse row) graph container with the kernels and
//! harness of a shared-memory graph benchmark suite.
//!
//! ## Architecture
//!
//! Data flows strictly upward:
//!
//! ```text
//! primitives (Bitmap, SlidingQueue, PVec, StorageBuf)
//!     → builder (edge list → CSR)
//!     → CsrGraph (immutable, Send + Sync)
//!     → kernels (direction-optimizing BFS, delta-stepping SSSP)
//!     → bench harness / gapbench binary
//! ```
//!
//! - **Storage**: every CSR array is a [`StorageBuf`] obtained from the
//!   [`StorageAlloc`] strategy owned by a [`Session`]: the process heap, or a
//!   bump arena over a fixed physical region (`/dev/mem`) or an anonymous one.
//! - **Construction**: [`Builder`] runs a parallel degree count, a prefix sum,
//!   a parallel scatter with atomic cursors, and a per-vertex squish.
//! - **Kernels**: shared mutable state (parents, distances, frontiers) is
//!   coordinated through atomics only; CSR arrays are read-only.
//!
//! ## Example
//!
//! ```
//! use gapgraph::{direction_optimizing_bfs, BfsOptions, BuildOptions, Edge, Session};
//!
//! let session = Session::heap();
//! let graph = session
//!     .builder(BuildOptions::undirected())
//!     .build(vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)])
//!     .unwrap();
//! let tree = direction_optimizing_bfs(&graph, 0, &BfsOptions::default()).unwrap();
//! assert_eq!(tree.reached_count(), 3);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

pub mod alloc;
pub mod bench;
pub mod collections;
pub mod concurrency;
pub mod error;
pub mod graph;
pub mod kernels;
pub mod session;

pub use alloc::{AllocError, AllocatorChoice, HeapAlloc, RegionArena, SharedAlloc, StorageAlloc, StorageBuf};
pub use bench::{BenchConfig, BenchOptions, KernelReport};
pub use collections::{PVec, QueueBuffer, SlidingQueue};
pub use concurrency::Bitmap;
pub use error::{GraphError, Result};
pub use graph::{
    BuildOptions, Builder, CsrGraph, Edge, Graph, MergePolicy, Neighbor, NodeId, WGraph, WNode, Weight,
};
pub use kernels::{
    delta_stepping, direction_optimizing_bfs, top_down_bfs, BfsOptions, BfsTree, ShortestPaths,
    SsspOptions, VerificationFailure, DIST_INF,
};
pub use session::Session;
