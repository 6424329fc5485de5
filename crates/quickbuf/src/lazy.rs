// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lazily allocated sub-message slot.

use core::fmt;

/// Owned sub-message storage that allocates on first mutable access.
///
/// Presence lives in the parent's bit-set, not here: once allocated,
/// the slot keeps its message across clears so decode loops reuse it.
pub struct Lazy<M> {
    slot: Option<Box<M>>,
}

impl<M> Lazy<M> {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// The stored message, if one was ever allocated.
    #[inline]
    pub fn get(&self) -> Option<&M> {
        self.slot.as_deref()
    }

    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut M> {
        self.slot.as_deref_mut()
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.slot.is_some()
    }

    /// Drops the stored message.
    pub fn release(&mut self) {
        self.slot = None;
    }
}

impl<M: Default> Lazy<M> {
    /// Returns the stored message, allocating a default one first if needed.
    #[inline]
    pub fn get_or_init(&mut self) -> &mut M {
        self.slot.get_or_insert_with(Box::default)
    }
}

impl<M> Default for Lazy<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Clone> Clone for Lazy<M> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for Lazy<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(message) => message.fmt(f),
            None => f.write_str("<unallocated>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_once() {
        let mut slot: Lazy<Vec<u8>> = Lazy::new();
        assert!(!slot.is_allocated());
        assert!(slot.get().is_none());

        slot.get_or_init().push(7);
        slot.get_or_init().push(8);
        assert_eq!(slot.get(), Some(&vec![7, 8]));

        slot.release();
        assert!(!slot.is_allocated());
    }
}
