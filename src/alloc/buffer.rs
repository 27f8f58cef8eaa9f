//! `StorageBuf<T>` is a move-only, fixed-length array owned through a [`StorageAlloc`].
//!
//! The buffer is sized once at construction and never grows: CSR layouts are
//! written once and then only read. On drop the memory goes back to the
//! allocator that produced it, which for an arena reduces to an ownership check.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;
use std::sync::Arc;

use rayon::prelude::*;
use zerocopy::FromZeroes;

use super::allocator::StorageAlloc;

/// Handle to a storage strategy, shared by every buffer it produced.
pub type SharedAlloc = Arc<dyn StorageAlloc>;

/// A fixed-length array allocated through a [`StorageAlloc`].
pub struct StorageBuf<T> {
    ptr: NonNull<T>,
    len: usize,
    alloc: SharedAlloc,
    _owns: PhantomData<T>,
}

impl<T: Copy + Send + Sync> StorageBuf<T> {
    /// Allocates `len` slots without initializing them.
    ///
    /// Allocation failure is fatal: the diagnostic is logged and the process
    /// aborts through [`std::alloc::handle_alloc_error`], because a CSR layout
    /// cannot be extended or retried piecewise.
    ///
    /// # Safety
    /// Every slot must be written before it is read.
    pub unsafe fn new_uninit(alloc: &SharedAlloc, len: usize) -> Self {
        let layout = match Layout::array::<T>(len) {
            Ok(layout) => layout,
            Err(_) => {
                tracing::error!(len, "storage buffer size overflows");
                std::process::abort();
            }
        };
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            match alloc.allocate(layout) {
                Ok(ptr) => ptr.cast::<T>(),
                Err(err) => {
                    tracing::error!(allocator = alloc.name(), %err, "storage exhausted");
                    std::alloc::handle_alloc_error(layout);
                }
            }
        };
        Self {
            ptr,
            len,
            alloc: Arc::clone(alloc),
            _owns: PhantomData,
        }
    }

    /// Allocates a buffer and copies `src` into it with a parallel chunked copy.
    pub fn from_slice(alloc: &SharedAlloc, src: &[T]) -> Self {
        // SAFETY: every slot is written by the copy below.
        let mut buf = unsafe { Self::new_uninit(alloc, src.len()) };
        buf.par_chunks_mut(COPY_CHUNK)
            .zip(src.par_chunks(COPY_CHUNK))
            .for_each(|(dst, src)| dst.copy_from_slice(src));
        buf
    }
}

impl<T: Copy + Send + Sync + FromZeroes> StorageBuf<T> {
    /// Allocates `len` zeroed slots.
    pub fn zeroed(alloc: &SharedAlloc, len: usize) -> Self {
        // SAFETY: `T: FromZeroes`, so all-zero bytes are a valid `T`.
        let buf = unsafe { Self::new_uninit(alloc, len) };
        if len != 0 {
            // SAFETY: the allocation spans exactly `len` elements.
            unsafe { buf.ptr.as_ptr().write_bytes(0, len) };
        }
        buf
    }
}

const COPY_CHUNK: usize = 1 << 16;

impl<T> StorageBuf<T> {
    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the allocator this buffer belongs to.
    pub fn allocator(&self) -> &SharedAlloc {
        &self.alloc
    }

    /// Returns the start address of the storage.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }
}

impl<T> Deref for StorageBuf<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: ptr is valid for len elements (dangling + len 0 is allowed).
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> DerefMut for StorageBuf<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: exclusive access through `&mut self`.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T> Drop for StorageBuf<T> {
    fn drop(&mut self) {
        let size = core::mem::size_of::<T>() * self.len;
        if size == 0 {
            return;
        }
        let bytes = self.ptr.cast::<u8>();
        if self.alloc.owns(bytes) {
            // SAFETY: same layout as `new_uninit` computed (it did not overflow).
            unsafe {
                let layout = Layout::from_size_align_unchecked(size, core::mem::align_of::<T>());
                self.alloc.release(bytes, layout);
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StorageBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageBuf")
            .field("len", &self.len)
            .field("allocator", &self.alloc.name())
            .finish()
    }
}

// SAFETY: the buffer owns its elements exclusively, like `Vec<T>`.
unsafe impl<T: Send> Send for StorageBuf<T> {}
unsafe impl<T: Sync> Sync for StorageBuf<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::HeapAlloc;

    #[test]
    fn test_zeroed_and_copy() {
        let alloc: SharedAlloc = Arc::new(HeapAlloc::new());
        let zeros = StorageBuf::<u64>::zeroed(&alloc, 10);
        assert!(zeros.iter().all(|&x| x == 0));

        let src: Vec<u32> = (0..1000).collect();
        let copy = StorageBuf::from_slice(&alloc, &src);
        assert_eq!(&copy[..], &src[..]);
    }

    #[test]
    fn test_empty_buffer_skips_allocator() {
        let alloc: SharedAlloc = Arc::new(HeapAlloc::new());
        let empty = StorageBuf::<u32>::zeroed(&alloc, 0);
        assert!(empty.is_empty());
        assert_eq!(&empty[..], &[] as &[u32]);
    }
}
