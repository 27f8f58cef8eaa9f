//! Storage strategies for CSR backing arrays.
//!
//! - `allocator`: the [`StorageAlloc`] strategy trait and [`AllocatorChoice`]
//! - `heap`: the default heap strategy
//! - `region`: bump arena over a fixed, pre-mapped region
//! - `buffer`: [`StorageBuf`], the move-only array type graphs are made of

pub mod allocator;
pub mod buffer;
pub mod heap;
pub mod region;
#[cfg(unix)]
mod syscall;

pub use allocator::{AllocError, AllocatorChoice, StorageAlloc};
pub use buffer::{SharedAlloc, StorageBuf};
pub use heap::HeapAlloc;
pub use region::{RegionArena, RegionSource};
