//! Raw region mapping for the arena strategy.

use core::ptr;

use super::allocator::AllocError;

/// Maps `size` bytes of physical memory starting at `phys_addr` through `/dev/mem`.
///
/// Requires root (or `CAP_SYS_RAWIO`) and a kernel booted with `iomem=relaxed`.
///
/// # Safety
/// The physical range must be reserved from the OS (e.g. `mem=` boot
/// parameter) and must not be mapped by any unrelated process.
#[cfg(unix)]
pub unsafe fn map_physical(phys_addr: u64, size: usize) -> Result<*mut u8, AllocError> {
    if size == 0 {
        return Err(AllocError::InvalidRegion);
    }
    let offset = libc::off_t::try_from(phys_addr).map_err(|_| AllocError::InvalidRegion)?;
    let fd = libc::open(
        b"/dev/mem\0".as_ptr().cast::<libc::c_char>(),
        libc::O_RDWR | libc::O_SYNC,
    );
    if fd < 0 {
        return Err(AllocError::Map { errno: last_errno() });
    }
    let mapped = libc::mmap(
        ptr::null_mut(),
        size,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_SHARED,
        fd,
        offset,
    );
    let errno = last_errno();
    libc::close(fd);
    if mapped == libc::MAP_FAILED {
        Err(AllocError::Map { errno })
    } else {
        Ok(mapped.cast::<u8>())
    }
}

/// Maps `size` bytes of anonymous private memory.
///
/// # Safety
/// The returned region must be released with [`unmap`] exactly once.
#[cfg(unix)]
pub unsafe fn map_anonymous(size: usize) -> Result<*mut u8, AllocError> {
    if size == 0 {
        return Err(AllocError::InvalidRegion);
    }
    let mapped = libc::mmap(
        ptr::null_mut(),
        size,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANON,
        -1,
        0,
    );
    if mapped == libc::MAP_FAILED {
        Err(AllocError::Map { errno: last_errno() })
    } else {
        Ok(mapped.cast::<u8>())
    }
}

/// Unmaps a region produced by [`map_physical`] or [`map_anonymous`].
///
/// # Safety
/// `ptr`/`size` must describe a live mapping with no outstanding borrows.
#[cfg(unix)]
pub unsafe fn unmap(ptr: *mut u8, size: usize) {
    if ptr.is_null() || size == 0 {
        return;
    }
    libc::munmap(ptr.cast::<libc::c_void>(), size);
}

#[cfg(unix)]
fn last_errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}
