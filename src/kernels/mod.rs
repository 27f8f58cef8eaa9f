//! Graph kernels and their serial references.
//!
//! - `bfs`: direction-optimizing and top-down BFS
//! - `sssp`: delta-stepping shortest paths
//! - `verify`: serial BFS / Dijkstra and the result checkers

pub mod bfs;
pub mod sssp;
pub mod verify;

pub use bfs::{direction_optimizing_bfs, top_down_bfs, BfsOptions, BfsTree};
pub use sssp::{delta_stepping, ShortestPaths, SsspOptions, DIST_INF};
pub use verify::{
    serial_bfs_depths, serial_dijkstra, verify_bfs_tree, verify_distances, VerificationFailure,
};
