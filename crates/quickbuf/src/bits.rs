// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-size presence bit-set.

use core::fmt;

/// One bit per declared field, packed into `WORDS` 64-bit words.
///
/// Bit `i` belongs to the field at index `i` of the message descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitSet<const WORDS: usize> {
    words: [u64; WORDS],
}

impl<const WORDS: usize> BitSet<WORDS> {
    /// Number of addressable bits.
    pub const CAPACITY: usize = WORDS * 64;

    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    pub const fn from_words(words: [u64; WORDS]) -> Self {
        Self { words }
    }

    pub const fn words(&self) -> &[u64; WORDS] {
        &self.words
    }

    /// # Panics
    ///
    /// If `index >= Self::CAPACITY`.
    #[inline]
    pub const fn is_set(&self, index: usize) -> bool {
        self.words[index >> 6] & (1u64 << (index & 63)) != 0
    }

    #[inline]
    pub fn set(&mut self, index: usize) {
        self.words[index >> 6] |= 1u64 << (index & 63);
    }

    #[inline]
    pub fn unset(&mut self, index: usize) {
        self.words[index >> 6] &= !(1u64 << (index & 63));
    }

    /// Clears every bit that is set in `mask`.
    #[inline]
    pub fn unset_all(&mut self, mask: &Self) {
        for (word, m) in self.words.iter_mut().zip(mask.words.iter()) {
            *word &= !m;
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.words = [0; WORDS];
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// True if every bit of `mask` is set here.
    #[inline]
    pub fn contains_all(&self, mask: &Self) -> bool {
        self.words.iter().zip(mask.words.iter()).all(|(w, m)| w & m == *m)
    }

    /// True if any bit of `mask` is set here.
    #[inline]
    pub fn intersects(&self, mask: &Self) -> bool {
        self.words.iter().zip(mask.words.iter()).any(|(w, m)| w & m != 0)
    }

    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Indices of the set bits, ascending.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..Self::CAPACITY).filter(move |i| self.is_set(*i))
    }
}

impl<const WORDS: usize> Default for BitSet<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> fmt::Debug for BitSet<WORDS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
