//! `RegionArena` is a bump allocator over one pre-mapped, fixed-size region.
//!
//! Requests are served by advancing an atomic cursor. Nothing is ever
//! reclaimed: `release` is a no-op and the whole region is unmapped when the
//! last handle to the arena goes away. Exhaustion is reported to the caller;
//! graph buffers treat it as fatal.

use core::alloc::Layout;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use super::allocator::{AllocError, StorageAlloc};
#[cfg(unix)]
use super::syscall;

/// How the arena's region was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// Physical memory mapped through `/dev/mem`.
    Physical {
        /// Physical base address.
        base_address: u64,
    },
    /// Anonymous private mapping.
    Anonymous,
}

/// A thread-safe bump allocator over a mapped region.
#[derive(Debug)]
pub struct RegionArena {
    base: NonNull<u8>,
    size: usize,
    cursor: CachePadded<AtomicUsize>,
    source: RegionSource,
}

impl RegionArena {
    /// Maps `size` bytes of physical memory at `base_address` via `/dev/mem`.
    ///
    /// # Errors
    /// Fails if `/dev/mem` cannot be opened or mapped.
    ///
    /// # Safety
    /// The physical range must be reserved from the OS and must not be shared
    /// with unrelated processes.
    #[cfg(unix)]
    pub unsafe fn map_physical(base_address: u64, size: usize) -> Result<Self, AllocError> {
        // SAFETY: forwarded caller contract.
        let ptr = unsafe { syscall::map_physical(base_address, size)? };
        tracing::info!(
            base_address = format_args!("{base_address:#x}"),
            size_mib = size >> 20,
            virt = ?ptr,
            "mapped physical arena"
        );
        Ok(Self::from_mapping(
            ptr,
            size,
            RegionSource::Physical { base_address },
        ))
    }

    /// Maps `size` bytes of anonymous memory and serves it with bump semantics.
    ///
    /// # Errors
    /// Fails if the mapping cannot be created.
    #[cfg(unix)]
    pub fn anonymous(size: usize) -> Result<Self, AllocError> {
        // SAFETY: the mapping is owned by the returned arena and unmapped on drop.
        let ptr = unsafe { syscall::map_anonymous(size)? };
        Ok(Self::from_mapping(ptr, size, RegionSource::Anonymous))
    }

    fn from_mapping(ptr: *mut u8, size: usize, source: RegionSource) -> Self {
        Self {
            // mmap never returns null on success.
            base: NonNull::new(ptr).unwrap_or(NonNull::dangling()),
            size,
            cursor: CachePadded::new(AtomicUsize::new(0)),
            source,
        }
    }

    /// Returns the region size in bytes.
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// Returns the bytes consumed so far (including alignment padding).
    pub fn used(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Returns how the region was obtained.
    pub fn source(&self) -> RegionSource {
        self.source
    }

    /// Returns the base address of the mapping.
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }
}

impl StorageAlloc for RegionArena {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let base = self.base.as_ptr() as usize;
        let align = layout.align();
        let mut current = self.cursor.load(Ordering::Relaxed);
        loop {
            let start = (base + current + align - 1) & !(align - 1);
            let offset = start - base;
            let end = offset
                .checked_add(layout.size())
                .filter(|&end| end <= self.size)
                .ok_or(AllocError::Exhausted {
                    requested: layout.size() + (offset - current),
                    used: current,
                    capacity: self.size,
                })?;
            match self.cursor.compare_exchange_weak(
                current,
                end,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                // SAFETY: offset < size, so the pointer stays inside the mapping.
                Ok(_) => return Ok(unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) }),
                Err(observed) => current = observed,
            }
        }
    }

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        let p = ptr.as_ptr() as usize;
        let base = self.base.as_ptr() as usize;
        p >= base && p < base + self.size
    }

    unsafe fn release(&self, _ptr: NonNull<u8>, _layout: Layout) {
        // No-op: the region is reclaimed as a whole.
    }

    fn name(&self) -> &'static str {
        match self.source {
            RegionSource::Physical { .. } => "fixed-region",
            RegionSource::Anonymous => "anonymous-region",
        }
    }

    fn used_bytes(&self) -> Option<usize> {
        Some(self.used())
    }
}

// SAFETY: the region is only handed out in disjoint pieces through the atomic cursor.
unsafe impl Send for RegionArena {}
unsafe impl Sync for RegionArena {}

impl Drop for RegionArena {
    fn drop(&mut self) {
        tracing::debug!(
            used_mib = self.used() >> 20,
            capacity_mib = self.size >> 20,
            "releasing arena"
        );
        #[cfg(unix)]
        // SAFETY: every buffer holds an `Arc` to the arena, so none outlive this drop.
        unsafe {
            syscall::unmap(self.base.as_ptr(), self.size);
        }
    }
}
