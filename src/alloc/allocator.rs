use core::alloc::Layout;
use core::fmt;
use core::ptr::NonNull;

use serde::{Deserialize, Serialize};

/// A storage strategy for CSR backing arrays.
///
/// Graph buffers keep an `Arc` to the strategy that produced them and hand
/// their memory back through it when dropped. Implementations must be
/// thread-safe: the builder allocates from worker threads.
pub trait StorageAlloc: Send + Sync + fmt::Debug {
    /// Allocates memory according to the given layout.
    ///
    /// `layout.size()` is never zero; zero-sized buffers never reach the allocator.
    ///
    /// # Errors
    /// Returns `AllocError` if the request cannot be satisfied.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Returns `true` if `ptr` was handed out by this allocator.
    fn owns(&self, ptr: NonNull<u8>) -> bool;

    /// Gives memory back to the allocator.
    ///
    /// # Safety
    /// `ptr` must denote a block currently allocated by this allocator with
    /// the same `layout`.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Bytes handed out so far, when the allocator tracks it.
    fn used_bytes(&self) -> Option<usize> {
        None
    }
}

/// The error type for allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// A fixed region has no room left for the request.
    Exhausted {
        /// Bytes requested (including alignment padding).
        requested: usize,
        /// Bytes already in use.
        used: usize,
        /// Total region size.
        capacity: usize,
    },
    /// The system heap returned null.
    Heap {
        /// Bytes requested.
        requested: usize,
    },
    /// The backing region could not be mapped.
    Map {
        /// `errno` reported by the failing call.
        errno: i32,
    },
    /// The requested region size is unusable (zero or overflowing).
    InvalidRegion,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Exhausted {
                requested,
                used,
                capacity,
            } => write!(
                f,
                "arena out of memory (need {requested} bytes, used {used} / {capacity})"
            ),
            Self::Heap { requested } => write!(f, "heap allocation of {requested} bytes failed"),
            Self::Map { errno } => write!(
                f,
                "mapping the backing region failed (errno {errno}); run as root and boot with iomem=relaxed for /dev/mem"
            ),
            Self::InvalidRegion => f.write_str("region size must be non-zero"),
        }
    }
}

impl std::error::Error for AllocError {}

/// Which storage strategy a [`Session`](crate::Session) uses for graph arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocatorChoice {
    /// Ordinary process heap.
    #[default]
    Heap,
    /// Bump arena over a physical range mapped through `/dev/mem`.
    FixedRegion {
        /// Physical base address of the reserved range.
        base_address: u64,
        /// Size of the range in bytes.
        size: usize,
    },
    /// Bump arena over an anonymous private mapping.
    AnonymousRegion {
        /// Size of the mapping in bytes.
        size: usize,
    },
}
