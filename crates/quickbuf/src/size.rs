// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encoded size of tagged fields.
//!
//! Every function returns the full size of the field (tags included) as
//! [`crate::Sink`] writes it. Sub-message sizes are recomputed and cached.

use crate::kind::{ProtoEnum, ScalarKind};
use crate::message::ProtoMessage;
use crate::repeated::{RepeatedBytes, RepeatedMessage, RepeatedString};
use crate::wire::{int32_size, varint64_size};

pub use crate::wire::tag_size;

#[inline]
pub fn field<K: ScalarKind>(field_number: u32, value: K::Value) -> usize {
    tag_size(field_number) + K::encoded_size(value)
}

/// Bytes of the concatenated values of a packed span (no tag, no length).
pub fn packed_payload<K: ScalarKind>(values: &[K::Value]) -> usize {
    match K::FIXED_SIZE {
        Some(size) => size * values.len(),
        None => values.iter().map(|v| K::encoded_size(*v)).sum(),
    }
}

pub fn packed<K: ScalarKind>(field_number: u32, values: &[K::Value]) -> usize {
    if values.is_empty() {
        return 0;
    }
    length_delimited(field_number, packed_payload::<K>(values))
}

pub fn repeated<K: ScalarKind>(field_number: u32, values: &[K::Value]) -> usize {
    let tags = tag_size(field_number) * values.len();
    match K::FIXED_SIZE {
        Some(size) => tags + size * values.len(),
        None => tags + values.iter().map(|v| K::encoded_size(*v)).sum::<usize>(),
    }
}

/// Tag, length prefix and `length` payload bytes.
#[inline]
pub fn length_delimited(field_number: u32, length: usize) -> usize {
    tag_size(field_number) + varint64_size(length as u64) + length
}

#[inline]
pub fn string(field_number: u32, value: &str) -> usize {
    length_delimited(field_number, value.len())
}

#[inline]
pub fn bytes(field_number: u32, value: &[u8]) -> usize {
    length_delimited(field_number, value.len())
}

pub fn message<M: ProtoMessage>(field_number: u32, value: &M) -> usize {
    length_delimited(field_number, value.compute_serialized_size())
}

/// Start tag, body and end tag (both tags have the same size).
pub fn group<M: ProtoMessage>(field_number: u32, value: &M) -> usize {
    2 * tag_size(field_number) + value.compute_serialized_size()
}

#[inline]
pub fn enumeration<E: ProtoEnum>(field_number: u32, value: E) -> usize {
    tag_size(field_number) + int32_size(value.number())
}

pub fn packed_enum_payload<E: ProtoEnum>(values: &[E]) -> usize {
    values.iter().map(|v| int32_size(v.number())).sum()
}

pub fn packed_enums<E: ProtoEnum>(field_number: u32, values: &[E]) -> usize {
    if values.is_empty() {
        return 0;
    }
    length_delimited(field_number, packed_enum_payload(values))
}

pub fn repeated_enums<E: ProtoEnum>(field_number: u32, values: &[E]) -> usize {
    tag_size(field_number) * values.len() + packed_enum_payload(values)
}

pub fn repeated_strings(field_number: u32, values: &RepeatedString) -> usize {
    values.iter().map(|v| string(field_number, v)).sum()
}

pub fn repeated_bytes(field_number: u32, values: &RepeatedBytes) -> usize {
    values.iter().map(|v| bytes(field_number, v)).sum()
}

pub fn repeated_messages<M: ProtoMessage>(field_number: u32, values: &RepeatedMessage<M>) -> usize {
    values.iter().map(|v| message(field_number, v)).sum()
}

pub fn repeated_groups<M: ProtoMessage>(field_number: u32, values: &RepeatedMessage<M>) -> usize {
    values.iter().map(|v| group(field_number, v)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Double, Int32, SInt64, UInt64};

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(field::<Int32>(1, 1), 2);
        assert_eq!(field::<Int32>(1, -1), 11);
        assert_eq!(field::<SInt64>(16, -1), 3);
        assert_eq!(field::<Double>(1, 0.0), 9);
    }

    #[test]
    fn test_packed_and_repeated_sizes() {
        let values = [3, 270, 86_942];
        assert_eq!(packed_payload::<Int32>(&values), 6);
        assert_eq!(packed::<Int32>(4, &values), 8);
        assert_eq!(repeated::<Int32>(4, &values), 9);
        assert_eq!(packed::<UInt64>(4, &[]), 0);
        assert_eq!(packed::<Double>(1, &[1.0, 2.0]), 1 + 1 + 16);
    }

    #[test]
    fn test_length_delimited_sizes() {
        assert_eq!(string(1, ""), 2);
        assert_eq!(bytes(1, &[0; 200]), 1 + 2 + 200);
        let strings: RepeatedString = ["ab", "c"].into_iter().collect();
        assert_eq!(repeated_strings(2, &strings), 4 + 3);
    }
}
