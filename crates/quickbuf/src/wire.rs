// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protobuf wire-format primitives.
//!
//! Tag layout, wire types, zigzag mapping and varint byte counts. All of
//! this is pure and shared by the decode and encode engines.

/// Number of low tag bits holding the wire type.
pub const TAG_TYPE_BITS: u32 = 3;

/// Mask extracting the wire type from a tag.
pub const TAG_TYPE_MASK: u32 = (1 << TAG_TYPE_BITS) - 1;

/// On-the-wire encoding of a field payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    /// Decodes the low three tag bits; 6 and 7 are not wire types.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            3 => Some(Self::StartGroup),
            4 => Some(Self::EndGroup),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }

    pub const fn as_raw(self) -> u32 {
        self as u32
    }
}

/// `(field_number << 3) | wire_type`
#[inline]
pub const fn make_tag(field_number: u32, wire_type: WireType) -> u32 {
    (field_number << TAG_TYPE_BITS) | wire_type as u32
}

#[inline]
pub const fn tag_field_number(tag: u32) -> u32 {
    tag >> TAG_TYPE_BITS
}

/// Raw wire type bits of `tag` (may be an invalid 6 or 7).
#[inline]
pub const fn tag_wire_type(tag: u32) -> u32 {
    tag & TAG_TYPE_MASK
}

// =======================================================================
// Zigzag
// =======================================================================

#[inline]
pub const fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

#[inline]
pub const fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

#[inline]
pub const fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[inline]
pub const fn zigzag_decode64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

// =======================================================================
// Sizes
// =======================================================================

/// Bytes needed to varint-encode `value` (1-5).
#[inline]
pub const fn varint32_size(value: u32) -> usize {
    if value < 1 << 7 {
        1
    } else if value < 1 << 14 {
        2
    } else if value < 1 << 21 {
        3
    } else if value < 1 << 28 {
        4
    } else {
        5
    }
}

/// Bytes needed to varint-encode `value` (1-10).
#[inline]
pub const fn varint64_size(value: u64) -> usize {
    // ceil(significant_bits / 7), with zero taking one byte
    ((((value | 1).leading_zeros() ^ 63) * 9 + 73) / 64) as usize
}

/// Size of an `int32`/`enum` varint; negative values sign-extend to 10 bytes.
#[inline]
pub const fn int32_size(value: i32) -> usize {
    if value >= 0 {
        varint32_size(value as u32)
    } else {
        crate::config::MAX_VARINT64_BYTES
    }
}

/// Size of the tag for `field_number` (the wire type never changes it).
#[inline]
pub const fn tag_size(field_number: u32) -> usize {
    varint32_size(field_number << TAG_TYPE_BITS)
}

// =======================================================================
// Raw varint helpers for unknown-field buffers
// =======================================================================

pub(crate) fn push_varint32(out: &mut Vec<u8>, value: u32) {
    push_varint64(out, u64::from(value));
}

pub(crate) fn push_varint64(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_layout() {
        let tag = make_tag(2, WireType::Varint);
        assert_eq!(tag, 0x10);
        assert_eq!(tag_field_number(tag), 2);
        assert_eq!(tag_wire_type(tag), 0);

        let tag = make_tag(1, WireType::LengthDelimited);
        assert_eq!(tag, 0x0A);
        assert_eq!(WireType::from_raw(tag_wire_type(tag)), Some(WireType::LengthDelimited));
        assert_eq!(WireType::from_raw(6), None);
        assert_eq!(WireType::from_raw(7), None);
    }

    #[test]
    fn test_zigzag_known_values() {
        let cases32: [(i32, u32); 6] = [
            (0, 0),
            (-1, 1),
            (1, 2),
            (-2, 3),
            (i32::MAX, 0xFFFF_FFFE),
            (i32::MIN, 0xFFFF_FFFF),
        ];
        for (signed, encoded) in cases32 {
            assert_eq!(zigzag_encode32(signed), encoded);
            assert_eq!(zigzag_decode32(encoded), signed);
        }

        assert_eq!(zigzag_encode64(-1), 1);
        assert_eq!(zigzag_encode64(i64::MIN), u64::MAX);
        assert_eq!(zigzag_decode64(u64::MAX - 1), i64::MAX);
    }

    #[test]
    fn test_varint_sizes() {
        assert_eq!(varint32_size(0), 1);
        assert_eq!(varint32_size(127), 1);
        assert_eq!(varint32_size(128), 2);
        assert_eq!(varint32_size(16_383), 2);
        assert_eq!(varint32_size(16_384), 3);
        assert_eq!(varint32_size(u32::MAX), 5);

        assert_eq!(varint64_size(0), 1);
        assert_eq!(varint64_size(127), 1);
        assert_eq!(varint64_size(128), 2);
        assert_eq!(varint64_size(u64::from(u32::MAX)), 5);
        assert_eq!(varint64_size(1 << 63), 10);
        assert_eq!(varint64_size(u64::MAX), 10);
    }

    #[test]
    fn test_varint_size_matches_encoding() {
        for shift in 0..64 {
            let value = 1u64 << shift;
            let mut out = Vec::new();
            push_varint64(&mut out, value);
            assert_eq!(out.len(), varint64_size(value), "value {value}");
        }
    }

    #[test]
    fn test_int32_size_sign_extends() {
        assert_eq!(int32_size(0), 1);
        assert_eq!(int32_size(300), 2);
        assert_eq!(int32_size(-1), 10);
        assert_eq!(int32_size(i32::MIN), 10);
    }

    #[test]
    fn test_tag_size() {
        assert_eq!(tag_size(1), 1);
        assert_eq!(tag_size(15), 1);
        assert_eq!(tag_size(16), 2);
        assert_eq!(tag_size(crate::config::MAX_FIELD_NUMBER), 5);
    }

    #[test]
    fn test_push_varint() {
        let mut out = Vec::new();
        push_varint32(&mut out, 300);
        assert_eq!(out, [0xAC, 0x02]);
    }
}
