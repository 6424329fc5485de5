// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Repeated scalar and enum values.

use core::fmt;
use core::ops::Deref;

use super::RepeatedField;
use crate::kind::ScalarValue;

/// Growable array of scalar (or enum) values.
///
/// Clearing keeps the backing storage, so a message decoded in a loop
/// stops allocating once its containers have grown to the working size.
#[derive(Clone, Default)]
pub struct Repeated<T> {
    values: Vec<T>,
}

impl<T: ScalarValue> Repeated<T> {
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.values.extend_from_slice(values);
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.values.get(index).copied()
    }

    /// Replaces the value at `index`.
    ///
    /// # Panics
    ///
    /// If `index >= self.len()`.
    pub fn set(&mut self, index: usize, value: T) {
        self.values[index] = value;
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Empties the container, keeping its storage.
    #[inline]
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Shortens the container to `len` values; no effect if it is already shorter.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    /// Empties the container and frees its storage.
    pub fn release(&mut self) {
        self.values = Vec::new();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    pub fn copy_from(&mut self, other: &Self) {
        self.values.clear();
        self.values.extend_from_slice(&other.values);
    }
}

impl<T: ScalarValue> RepeatedField for Repeated<T> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn remaining_capacity(&self) -> usize {
        self.values.capacity() - self.values.len()
    }

    fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }
}

impl<T> Deref for Repeated<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.values
    }
}

impl<T: ScalarValue> PartialEq for Repeated<T> {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self.values.iter().zip(&other.values).all(|(a, b)| a.same(*b))
    }
}

impl<T: ScalarValue> Eq for Repeated<T> {}

impl<T: fmt::Debug> fmt::Debug for Repeated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl<T> From<Vec<T>> for Repeated<T> {
    fn from(values: Vec<T>) -> Self {
        Self { values }
    }
}

impl<T: ScalarValue> FromIterator<T> for Repeated<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<T: ScalarValue> Extend<T> for Repeated<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

impl<'a, T> IntoIterator for &'a Repeated<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
