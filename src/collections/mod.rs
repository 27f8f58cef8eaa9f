//! Collections used by the builder and the kernels.
//!
//! - `pvec`: growable array with uninitialized growth and parallel fill
//! - `sliding_queue`: multi-producer frontier with round-delimited visibility

pub mod pvec;
pub mod sliding_queue;

pub use pvec::PVec;
pub use sliding_queue::{QueueBuffer, SlidingQueue};
