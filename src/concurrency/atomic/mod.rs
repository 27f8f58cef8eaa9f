//! Lock-free primitives shared by the kernels.
//!
//! Atomic read-modify-write operations have real hardware cost; these helpers
//! only centralize the retry loops so every kernel races the same way.

/// Word-packed atomic bitmaps.
pub mod bitmap;

use core::sync::atomic::{AtomicU64, Ordering};

pub use bitmap::Bitmap;

/// Lowers `slot` to `candidate` if `candidate` is strictly smaller.
///
/// Returns `true` iff this call performed the store. Concurrent callers
/// racing on the same slot leave it at the minimum of all candidates.
#[inline]
pub fn fetch_min_strict(slot: &AtomicU64, candidate: u64) -> bool {
    let mut current = slot.load(Ordering::Relaxed);
    while candidate < current {
        match slot.compare_exchange_weak(current, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return true,
            Err(observed) => current = observed,
        }
    }
    false
}
