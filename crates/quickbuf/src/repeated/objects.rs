// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Repeated strings, byte strings and messages with element recycling.

use core::fmt;
use core::ops::{Deref, Index};

use super::RepeatedField;

/// Element type whose allocations can be reused after a logical reset.
pub trait Reusable: Default {
    /// Makes the value logically empty while keeping its allocations.
    fn reset(&mut self);
    /// Deep copy of `other` into `self`, reusing `self`'s storage.
    fn copy_from(&mut self, other: &Self);
}

impl Reusable for String {
    fn reset(&mut self) {
        self.clear();
    }

    fn copy_from(&mut self, other: &Self) {
        self.clear();
        self.push_str(other);
    }
}

impl Reusable for Vec<u8> {
    fn reset(&mut self) {
        self.clear();
    }

    fn copy_from(&mut self, other: &Self) {
        self.clear();
        self.extend_from_slice(other);
    }
}

/// Growable array of owned objects.
///
/// The logical length is tracked separately from the backing `Vec`: slots
/// past `len()` keep their previous allocations and are handed out again by
/// [`RepeatedObjects::next_mut`].
pub struct RepeatedObjects<T> {
    items: Vec<T>,
    len: usize,
}

/// Repeated `string` field
pub type RepeatedString = RepeatedObjects<String>;
/// Repeated `bytes` field
pub type RepeatedBytes = RepeatedObjects<Vec<u8>>;
/// Repeated message or group field
pub type RepeatedMessage<M> = RepeatedObjects<M>;

impl<T> RepeatedObjects<T> {
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots available without growing, recycled ones included.
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items[..self.len]
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Logically empties the container; elements stay allocated for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Shortens the logical length to `len`. Dropped elements stay
    /// allocated and are recycled by [`RepeatedObjects::next_mut`].
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    /// Empties the container and drops every element.
    pub fn release(&mut self) {
        self.items = Vec::new();
        self.len = 0;
    }

    pub fn reserve(&mut self, additional: usize) {
        let spare = self.items.len() - self.len;
        if additional > spare {
            self.items.reserve(additional - spare);
        }
    }
}

impl<T: Reusable> RepeatedObjects<T> {
    /// Appends an empty element and returns it.
    ///
    /// A previously released slot is reset and reused instead of allocating.
    pub fn next_mut(&mut self) -> &mut T {
        if self.len == self.items.len() {
            self.items.push(T::default());
        } else {
            self.items[self.len].reset();
        }
        self.len += 1;
        &mut self.items[self.len - 1]
    }

    /// Appends a deep copy of `value`.
    pub fn push(&mut self, value: &T) {
        self.next_mut().copy_from(value);
    }

    /// Replaces the element at `index` with a copy of `value`.
    ///
    /// # Panics
    ///
    /// If `index >= self.len()`.
    pub fn set(&mut self, index: usize, value: &T) {
        self.as_mut_slice()[index].copy_from(value);
    }

    /// Appends copies of every element of `other`.
    pub fn extend_from(&mut self, other: &Self) {
        self.reserve(other.len);
        for item in other.iter() {
            self.push(item);
        }
    }

    pub fn copy_from(&mut self, other: &Self) {
        self.clear();
        self.extend_from(other);
    }
}

impl RepeatedObjects<String> {
    pub fn push_str(&mut self, value: &str) {
        self.next_mut().push_str(value);
    }
}

impl RepeatedObjects<Vec<u8>> {
    pub fn push_slice(&mut self, value: &[u8]) {
        self.next_mut().extend_from_slice(value);
    }
}

impl<T> RepeatedField for RepeatedObjects<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn remaining_capacity(&self) -> usize {
        self.items.capacity() - self.len
    }

    fn reserve(&mut self, additional: usize) {
        RepeatedObjects::reserve(self, additional);
    }
}

impl<T> Default for RepeatedObjects<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Reusable> Clone for RepeatedObjects<T> {
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        copy.extend_from(self);
        copy
    }
}

impl<T> Deref for RepeatedObjects<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> Index<usize> for RepeatedObjects<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: PartialEq> PartialEq for RepeatedObjects<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for RepeatedObjects<T> {}

impl<T: fmt::Debug> fmt::Debug for RepeatedObjects<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a RepeatedObjects<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for RepeatedString {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut strings = Self::new();
        for s in iter {
            strings.push_str(s.as_ref());
        }
        strings
    }
}
