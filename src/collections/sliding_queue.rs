//! `SlidingQueue` is a multi-producer frontier with round-delimited visibility.
//!
//! Memory layout: one shared array of `capacity` slots and three cursors.
//!
//! ```text
//!  0        out_start      out_end       shared_in        capacity
//!  |  retired  |   window    |  next round  |    free    |
//! ```
//!
//! Producers never write the shared array directly. Each worker appends to a
//! private [`QueueBuffer`] and flushes it with a single `fetch_add` on
//! `shared_in`, which reserves a disjoint range at the tail. Consumers only see
//! `[out_start, out_end)`. `slide_window` takes `&mut self`, so it cannot run
//! while any buffer is alive: items pushed during round *k* become visible in
//! round *k + 1* and never earlier.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Default number of items a [`QueueBuffer`] holds before flushing.
pub const DEFAULT_BUFFER_SIZE: usize = 16_384;

/// A fixed-capacity frontier with a sliding read window.
pub struct SlidingQueue<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    shared_in: CachePadded<AtomicUsize>,
    out_start: usize,
    out_end: usize,
}

impl<T: Copy + Send> SlidingQueue<T> {
    /// Creates an empty queue able to hold `capacity` items across all rounds
    /// since the last `reset`.
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        Self {
            slots,
            shared_in: CachePadded::new(AtomicUsize::new(0)),
            out_start: 0,
            out_end: 0,
        }
    }

    /// Total slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Appends a single item from the exclusive owner.
    ///
    /// # Panics
    /// Panics if the queue is full.
    pub fn push_back(&mut self, value: T) {
        let idx = *self.shared_in.get_mut();
        assert!(idx < self.slots.len(), "sliding queue overflow");
        *self.slots[idx].get_mut() = MaybeUninit::new(value);
        *self.shared_in.get_mut() = idx + 1;
    }

    /// Returns `true` if the current window is empty.
    pub fn is_empty(&self) -> bool {
        self.out_start == self.out_end
    }

    /// Number of items in the current window.
    pub fn len(&self) -> usize {
        self.out_end - self.out_start
    }

    /// Publishes everything pushed since the last slide as the new window.
    pub fn slide_window(&mut self) {
        self.out_start = self.out_end;
        self.out_end = *self.shared_in.get_mut();
    }

    /// Empties the queue, including unpublished items.
    pub fn reset(&mut self) {
        self.out_start = 0;
        self.out_end = 0;
        *self.shared_in.get_mut() = 0;
    }

    /// Returns the current window.
    pub fn window(&self) -> &[T] {
        let len = self.out_end - self.out_start;
        // SAFETY: slots in `[out_start, out_end)` were initialized before the
        // slide that published them. Producers only write at or beyond
        // `shared_in >= out_end`, so the window is never written concurrently.
        unsafe {
            let start = self.slots.as_ptr().add(self.out_start).cast::<T>();
            core::slice::from_raw_parts(start, len)
        }
    }

    /// Reserves `n` slots at the tail and copies `items` into them.
    fn append(&self, items: &[T]) {
        let n = items.len();
        if n == 0 {
            return;
        }
        let start = self.shared_in.fetch_add(n, Ordering::Relaxed);
        assert!(
            start + n <= self.slots.len(),
            "sliding queue overflow ({} + {n} > {})",
            start,
            self.slots.len()
        );
        // SAFETY: `[start, start + n)` was reserved for this call alone by the
        // fetch_add above and lies beyond the published window.
        unsafe {
            let dst = UnsafeCell::raw_get(self.slots.as_ptr().add(start)).cast::<T>();
            core::ptr::copy_nonoverlapping(items.as_ptr(), dst, n);
        }
    }
}

// SAFETY: concurrent access is limited to disjoint tail ranges (reserved with
// fetch_add) and reads of the published window, which is never written.
unsafe impl<T: Send> Sync for SlidingQueue<T> {}
unsafe impl<T: Send> Send for SlidingQueue<T> {}

impl<T> core::fmt::Debug for SlidingQueue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlidingQueue")
            .field("capacity", &self.slots.len())
            .field("out_start", &self.out_start)
            .field("out_end", &self.out_end)
            .field("shared_in", &self.shared_in.load(Ordering::Relaxed))
            .finish()
    }
}

/// A worker-private staging buffer for a [`SlidingQueue`].
///
/// Flushes when full and when dropped.
pub struct QueueBuffer<'q, T: Copy + Send> {
    queue: &'q SlidingQueue<T>,
    local: Vec<T>,
    limit: usize,
}

impl<'q, T: Copy + Send> QueueBuffer<'q, T> {
    /// Creates a buffer with the default flush threshold.
    pub fn new(queue: &'q SlidingQueue<T>) -> Self {
        Self::with_limit(queue, DEFAULT_BUFFER_SIZE)
    }

    /// Creates a buffer that flushes after `limit` items.
    pub fn with_limit(queue: &'q SlidingQueue<T>, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            queue,
            local: Vec::with_capacity(limit.min(DEFAULT_BUFFER_SIZE)),
            limit,
        }
    }

    /// Stages an item.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.local.push(value);
        if self.local.len() == self.limit {
            self.flush();
        }
    }

    /// Moves staged items into the shared queue.
    pub fn flush(&mut self) {
        self.queue.append(&self.local);
        self.local.clear();
    }
}

impl<T: Copy + Send> Drop for QueueBuffer<'_, T> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_items_visible_only_after_slide() {
        let mut q = SlidingQueue::with_capacity(8);
        q.push_back(1u32);
        assert!(q.is_empty());
        q.slide_window();
        assert_eq!(q.window(), &[1]);

        {
            let mut buf = QueueBuffer::new(&q);
            buf.push(2);
            buf.push(3);
            buf.flush();
            // Still the old round.
            assert_eq!(q.window(), &[1]);
        }
        q.slide_window();
        assert_eq!(q.window(), &[2, 3]);

        q.slide_window();
        assert!(q.is_empty());
    }

    #[test]
    fn test_parallel_producers_fill_disjoint_ranges() {
        let mut q = SlidingQueue::with_capacity(10_000);
        (0..10_000u32).into_par_iter().for_each_init(
            || QueueBuffer::with_limit(&q, 64),
            |buf, i| buf.push(i),
        );
        q.slide_window();
        let mut seen = q.window().to_vec();
        seen.sort_unstable();
        assert_eq!(seen, (0..10_000).collect::<Vec<_>>());
    }

    #[test]
    fn test_reset_starts_over() {
        let mut q = SlidingQueue::with_capacity(2);
        q.push_back(5u32);
        q.push_back(6);
        q.slide_window();
        q.reset();
        assert!(q.is_empty());
        q.push_back(7);
        q.slide_window();
        assert_eq!(q.window(), &[7]);
    }

    #[test]
    #[should_panic(expected = "sliding queue overflow")]
    fn test_overflow_panics() {
        let q = SlidingQueue::with_capacity(1);
        let mut buf = QueueBuffer::new(&q);
        buf.push(1u32);
        buf.push(2);
        buf.flush();
    }
}
