//! `HeapAlloc`: the default storage strategy.
//!
//! Delegates to the global allocator, so whichever `#[global_allocator]` the
//! binary installs (system, mimalloc, jemalloc) backs the CSR arrays.

use core::alloc::Layout;
use core::ptr::NonNull;
use std::alloc::{alloc, dealloc};

use super::allocator::{AllocError, StorageAlloc};

/// Heap-backed storage allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAlloc;

impl HeapAlloc {
    /// Creates the heap strategy.
    pub const fn new() -> Self {
        Self
    }
}

impl StorageAlloc for HeapAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(layout.size() != 0);
        // SAFETY: layout has non-zero size (trait contract).
        let ptr = unsafe { alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::Heap {
            requested: layout.size(),
        })
    }

    /// Every pointer released to the heap strategy came from it: buffers
    /// remember their allocator.
    fn owns(&self, _ptr: NonNull<u8>) -> bool {
        true
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller guarantees ptr/layout came from `allocate`.
        unsafe { dealloc(ptr.as_ptr(), layout) }
    }

    fn name(&self) -> &'static str {
        "heap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_alloc_roundtrip() {
        let heap = HeapAlloc::new();
        let layout = Layout::array::<u64>(16).unwrap();
        let ptr = heap.allocate(layout).unwrap();
        assert!(heap.owns(ptr));
        unsafe {
            let words = ptr.as_ptr().cast::<u64>();
            words.write(42);
            assert_eq!(*words, 42);
            heap.release(ptr, layout);
        }
    }
}
