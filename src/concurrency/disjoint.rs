//! Shared write handle for slices whose indices are partitioned between workers.
//!
//! The builder's scatter phase hands every edge a unique slot through an
//! atomic per-vertex cursor; each slot is written exactly once, by exactly one
//! worker, so the writes never alias.

use core::marker::PhantomData;

/// A `Sync` view of `&mut [T]` for writes at caller-partitioned indices.
pub struct DisjointWriter<'a, T> {
    ptr: *mut T,
    len: usize,
    _borrow: PhantomData<&'a mut [T]>,
}

impl<'a, T: Copy> DisjointWriter<'a, T> {
    /// Wraps `slice` for the duration of the borrow.
    pub fn new(slice: &'a mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _borrow: PhantomData,
        }
    }

    /// Writes `value` at `idx`.
    ///
    /// # Panics
    /// Panics if `idx` is out of bounds.
    ///
    /// # Safety
    /// No other thread may read or write `idx` while the writer is alive.
    #[inline]
    pub unsafe fn write(&self, idx: usize, value: T) {
        assert!(idx < self.len, "index {idx} out of bounds for {}", self.len);
        // SAFETY: in bounds; caller guarantees exclusive access to the slot.
        unsafe { self.ptr.add(idx).write(value) }
    }
}

// SAFETY: callers partition the index space, see `write`.
unsafe impl<T: Send> Send for DisjointWriter<'_, T> {}
unsafe impl<T: Send> Sync for DisjointWriter<'_, T> {}
