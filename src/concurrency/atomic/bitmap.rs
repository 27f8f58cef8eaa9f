//! Word-packed atomic bitmap.
//!
//! One bit per vertex. Parallel passes use the atomic `set_bit`/`test_and_set`;
//! passes that own the bitmap exclusively can use `set_bit_exclusive`, which
//! compiles to a plain OR. Between BFS rounds two bitmaps are swapped with
//! `core::mem::swap` and only the outgoing one is cleared.

use core::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

/// A dense bitmap with atomic set/test.
#[derive(Debug)]
pub struct Bitmap {
    bits: usize,
    words: Vec<AtomicUsize>,
}

impl Bitmap {
    /// Creates a new bitmap with `bits` bits, all cleared.
    pub fn new(bits: usize) -> Self {
        let words_len = bits.div_ceil(WORD_BITS);
        let words = (0..words_len).map(|_| AtomicUsize::new(0)).collect();
        Self { bits, words }
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.bits
    }

    /// Returns `true` if the bitmap has zero bits.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Clears all bits in parallel.
    pub fn reset(&self) {
        self.words
            .par_iter()
            .with_min_len(RESET_GRAIN)
            .for_each(|w| w.store(0, Ordering::Relaxed));
    }

    /// Returns whether `bit` is set.
    ///
    /// # Panics
    /// Panics if `bit >= len()`.
    #[inline]
    pub fn get_bit(&self, bit: usize) -> bool {
        assert!(bit < self.bits, "bit {bit} out of range for {}", self.bits);
        let (word, mask) = bit_word_mask(bit);
        (self.words[word].load(Ordering::Relaxed) & mask) != 0
    }

    /// Atomically sets `bit`.
    ///
    /// # Panics
    /// Panics if `bit >= len()`.
    #[inline]
    pub fn set_bit(&self, bit: usize) {
        assert!(bit < self.bits, "bit {bit} out of range for {}", self.bits);
        let (word, mask) = bit_word_mask(bit);
        self.words[word].fetch_or(mask, Ordering::Relaxed);
    }

    /// Sets `bit` and returns `true` iff this call observed it previously cleared.
    ///
    /// # Panics
    /// Panics if `bit >= len()`.
    #[inline]
    pub fn test_and_set(&self, bit: usize) -> bool {
        assert!(bit < self.bits, "bit {bit} out of range for {}", self.bits);
        let (word, mask) = bit_word_mask(bit);
        let prev = self.words[word].fetch_or(mask, Ordering::Relaxed);
        (prev & mask) == 0
    }

    /// Atomically clears `bit`.
    #[inline]
    pub fn clear_bit(&self, bit: usize) {
        assert!(bit < self.bits, "bit {bit} out of range for {}", self.bits);
        let (word, mask) = bit_word_mask(bit);
        self.words[word].fetch_and(!mask, Ordering::Relaxed);
    }

    /// Sets `bit` without an atomic read-modify-write.
    #[inline]
    pub fn set_bit_exclusive(&mut self, bit: usize) {
        assert!(bit < self.bits, "bit {bit} out of range for {}", self.bits);
        let (word, mask) = bit_word_mask(bit);
        *self.words[word].get_mut() |= mask;
    }

    /// Clears all bits without atomics.
    pub fn reset_exclusive(&mut self) {
        for w in &mut self.words {
            *w.get_mut() = 0;
        }
    }

    /// Counts set bits.
    pub fn count_ones(&self) -> usize {
        self.words
            .par_iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// Calls `f` for every set bit of word `word`, in ascending order.
    #[inline]
    pub(crate) fn for_each_set_in_word(&self, word: usize, mut f: impl FnMut(usize)) {
        let mut bits = self.words[word].load(Ordering::Relaxed);
        let base = word * WORD_BITS;
        while bits != 0 {
            let tz = bits.trailing_zeros() as usize;
            f(base + tz);
            bits &= bits - 1;
        }
    }

    /// Number of backing words.
    #[inline]
    pub(crate) fn word_count(&self) -> usize {
        self.words.len()
    }
}

const WORD_BITS: usize = usize::BITS as usize;
const RESET_GRAIN: usize = 4096;

#[inline(always)]
fn bit_word_mask(bit: usize) -> (usize, usize) {
    // `usize::BITS` is a power of two, so shifts and masks suffice.
    (bit / WORD_BITS, 1usize << (bit % WORD_BITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_set_and_reset() {
        let b = Bitmap::new(130);
        assert_eq!(b.len(), 130);

        assert!(!b.get_bit(0));
        assert!(b.test_and_set(0));
        assert!(b.get_bit(0));
        assert!(!b.test_and_set(0));

        b.set_bit(129);
        assert!(b.get_bit(129));
        assert_eq!(b.count_ones(), 2);

        b.clear_bit(0);
        assert!(!b.get_bit(0));

        b.reset();
        assert!(!b.get_bit(129));
        assert_eq!(b.count_ones(), 0);
    }

    #[test]
    fn test_bitmap_exclusive_and_swap() {
        let mut front = Bitmap::new(70);
        let mut next = Bitmap::new(70);
        front.set_bit_exclusive(3);
        next.set_bit_exclusive(65);

        core::mem::swap(&mut front, &mut next);
        assert!(front.get_bit(65));
        assert!(next.get_bit(3));

        next.reset_exclusive();
        assert_eq!(next.count_ones(), 0);
    }

    #[test]
    fn test_bitmap_word_iteration() {
        let b = Bitmap::new(200);
        for bit in [1, 63, 64, 127, 199] {
            b.set_bit(bit);
        }
        let mut seen = Vec::new();
        for w in 0..b.word_count() {
            b.for_each_set_in_word(w, |bit| seen.push(bit));
        }
        assert_eq!(seen, vec![1, 63, 64, 127, 199]);
    }

    #[test]
    fn test_concurrent_test_and_set_single_winner() {
        let b = Bitmap::new(1);
        let winners: usize = (0..64)
            .into_par_iter()
            .map(|_| usize::from(b.test_and_set(0)))
            .sum();
        assert_eq!(winners, 1);
    }
}
