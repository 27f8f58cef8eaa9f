//! Concurrency primitives used on the kernels' hot paths.
//!
//! Nothing here takes a lock: shared state is coordinated through atomic
//! compare-and-swap and fetch-and-add only.

pub mod atomic;
pub mod disjoint;

pub use atomic::{fetch_min_strict, Bitmap};
pub use disjoint::DisjointWriter;
