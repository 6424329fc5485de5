// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Repeated field containers.
//!
//! - [`Repeated<T>`]: scalars and enums, one contiguous `Vec`
//! - [`RepeatedObjects<T>`]: strings, bytes and messages whose elements are
//!   recycled across clears

mod objects;
mod scalar;

pub use objects::{RepeatedBytes, RepeatedMessage, RepeatedObjects, RepeatedString, Reusable};
pub use scalar::Repeated;

/// Capacity hooks used by the decoder to pre-size a container.
pub trait RepeatedField {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Elements that fit without reallocating the backing storage.
    fn remaining_capacity(&self) -> usize;
    fn reserve(&mut self, additional: usize);
}
