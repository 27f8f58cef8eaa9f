//! `PVec` is a growable array that can skip default initialization.
//!
//! Goals:
//! - allocate large scratch arrays without a serial zeroing pass
//! - fill them with a parallel chunked loop instead
//! - otherwise behave like `Vec<T>` (it derefs to a slice)
//!
//! Uninitialized growth is `unsafe`: the caller takes over the obligation to
//! write each new slot before it is read. The builder does this for degree
//! arrays and scatter targets, which are fully overwritten right away.

use core::ops::{Deref, DerefMut};

use rayon::prelude::*;

/// Elements per task in parallel fills.
const FILL_CHUNK: usize = 1 << 14;

/// A `Vec`-like array for `Copy` data with optional uninitialized growth.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PVec<T> {
    data: Vec<T>,
}

impl<T: Copy + Send + Sync> PVec<T> {
    /// Creates an empty array.
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates an empty array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Creates an array of `len` slots without initializing them.
    ///
    /// # Safety
    /// Every slot must be written before it is read.
    pub unsafe fn uninit(len: usize) -> Self {
        let mut data = Vec::with_capacity(len);
        // SAFETY: capacity reserved above; caller fills before reading.
        unsafe { data.set_len(len) };
        Self { data }
    }

    /// Creates an array of `len` copies of `value`, filled in parallel.
    pub fn filled(len: usize, value: T) -> Self {
        // SAFETY: `fill` writes every slot.
        let mut v = unsafe { Self::uninit(len) };
        v.fill(value);
        v
    }

    /// Creates an array of `len` elements computed by `f(index)` in parallel.
    pub fn from_fn<F>(len: usize, f: F) -> Self
    where
        F: Fn(usize) -> T + Sync + Send,
    {
        // SAFETY: the chunked loop writes every slot.
        let mut v = unsafe { Self::uninit(len) };
        v.data
            .par_chunks_mut(FILL_CHUNK)
            .enumerate()
            .for_each(|(c, chunk)| {
                let base = c * FILL_CHUNK;
                for (i, slot) in chunk.iter_mut().enumerate() {
                    *slot = f(base + i);
                }
            });
        v
    }

    /// Overwrites every element with `value` using a parallel chunked loop.
    pub fn fill(&mut self, value: T) {
        self.data
            .par_chunks_mut(FILL_CHUNK)
            .for_each(|chunk| chunk.fill(value));
    }

    /// Grows or shrinks to `len` without initializing new slots.
    ///
    /// # Safety
    /// Slots at indices `old_len..len` must be written before they are read.
    pub unsafe fn resize_uninit(&mut self, len: usize) {
        if len > self.data.len() {
            self.data.reserve(len - self.data.len());
        }
        // SAFETY: capacity covers `len`; caller fills new slots.
        unsafe { self.data.set_len(len) };
    }

    /// Appends an element.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    /// Appends all elements of `other`.
    pub fn extend_from_slice(&mut self, other: &[T]) {
        self.data.extend_from_slice(other);
    }

    /// Reserves room for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
    }

    /// Returns the number of elements the array can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Removes all elements, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Shortens the array to `len` elements.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Releases the storage and returns it as a `Vec`.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Deref for PVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for PVec<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> From<Vec<T>> for PVec<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T> FromIterator<T> for PVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

impl<T: Send> FromParallelIterator<T> for PVec<T> {
    fn from_par_iter<I: IntoParallelIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: Vec::from_par_iter(iter),
        }
    }
}

impl<'a, T> IntoIterator for &'a PVec<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for PVec<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_and_from_fn() {
        let v = PVec::filled(40_000, 7u32);
        assert_eq!(v.len(), 40_000);
        assert!(v.iter().all(|&x| x == 7));

        let squares = PVec::from_fn(50_000, |i| (i as u64) * (i as u64));
        assert_eq!(squares[0], 0);
        assert_eq!(squares[49_999], 49_999 * 49_999);
    }

    #[test]
    fn test_resize_uninit_then_fill_tail() {
        let mut v: PVec<u32> = vec![1, 2, 3].into();
        unsafe { v.resize_uninit(6) };
        for slot in &mut v[3..] {
            *slot = 9;
        }
        assert_eq!(&v[..], &[1, 2, 3, 9, 9, 9]);

        unsafe { v.resize_uninit(2) };
        assert_eq!(&v[..], &[1, 2]);
    }

    #[test]
    fn test_push_and_collect() {
        let mut v = PVec::new();
        v.push(1u8);
        v.extend_from_slice(&[2, 3]);
        assert_eq!(v.into_vec(), vec![1, 2, 3]);

        let collected: PVec<usize> = (0..5usize).into_par_iter().collect();
        assert_eq!(&collected[..], &[0, 1, 2, 3, 4]);
    }
}
