// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type wire strategies.
//!
//! Each protobuf scalar type is a zero-sized marker implementing
//! [`ScalarKind`]. Generated code picks the marker at expansion time
//! (`input.read::<SInt32>()`, `output.write_packed::<Fixed64>(..)`), so no
//! per-field branching remains at run time.

use core::fmt;

use crate::error::Result;
use crate::sink::{Sink, WriteBackend};
use crate::source::{ReadBackend, Source};
use crate::wire::{int32_size, varint32_size, varint64_size, zigzag_encode32, zigzag_encode64, WireType};

/// Value stored for a scalar or enum field.
pub trait ScalarValue: Copy + Default + fmt::Debug {
    /// Value equality; floating point compares bit patterns.
    fn same(self, other: Self) -> bool;
}

macro_rules! impl_scalar_value {
    ($($ty:ty),*) => {
        $(impl ScalarValue for $ty {
            #[inline]
            fn same(self, other: Self) -> bool {
                self == other
            }
        })*
    };
}

impl_scalar_value!(bool, i32, i64, u32, u64);

impl ScalarValue for f32 {
    #[inline]
    fn same(self, other: Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl ScalarValue for f64 {
    #[inline]
    fn same(self, other: Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

/// Protobuf enum mapped to a Rust enum (`#[derive(quickbuf::ProtoEnum)]`).
///
/// Numbers without a variant are never stored in the field; the decoder
/// retains them as unknown bytes instead.
pub trait ProtoEnum: ScalarValue {
    fn number(self) -> i32;
    fn from_number(number: i32) -> Option<Self>;
}

/// Encoding strategy of one scalar protobuf type.
pub trait ScalarKind {
    type Value: ScalarValue;
    /// Wire type of one non-packed value.
    const WIRE_TYPE: WireType;
    /// Encoded size when it does not depend on the value.
    const FIXED_SIZE: Option<usize>;

    fn read<B: ReadBackend>(input: &mut Source<B>) -> Result<Self::Value>;
    fn write<B: WriteBackend>(output: &mut Sink<B>, value: Self::Value) -> Result<()>;
    /// Payload size of `value`, without tag.
    fn encoded_size(value: Self::Value) -> usize;
}

macro_rules! scalar_kind {
    ($(#[$doc:meta])* $name:ident, $value:ty, $wire:ident, $fixed:expr, $read:ident, $write:ident, $size:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl ScalarKind for $name {
            type Value = $value;
            const WIRE_TYPE: WireType = WireType::$wire;
            const FIXED_SIZE: Option<usize> = $fixed;

            #[inline]
            fn read<B: ReadBackend>(input: &mut Source<B>) -> Result<$value> {
                input.$read()
            }

            #[inline]
            fn write<B: WriteBackend>(output: &mut Sink<B>, value: $value) -> Result<()> {
                output.$write(value)
            }

            #[inline]
            fn encoded_size(value: $value) -> usize {
                let size: fn($value) -> usize = $size;
                size(value)
            }
        }
    };
}

scalar_kind!(
    /// `double`: fixed64 bit pattern
    Double, f64, Fixed64, Some(8), read_double, write_double_no_tag, |_| 8
);
scalar_kind!(
    /// `float`: fixed32 bit pattern
    Float, f32, Fixed32, Some(4), read_float, write_float_no_tag, |_| 4
);
scalar_kind!(
    /// `int32`: negative values sign-extend to 10 bytes
    Int32, i32, Varint, None, read_int32, write_int32_no_tag, int32_size
);
scalar_kind!(Int64, i64, Varint, None, read_int64, write_int64_no_tag, |v| varint64_size(v as u64));
scalar_kind!(UInt32, u32, Varint, None, read_uint32, write_uint32_no_tag, varint32_size);
scalar_kind!(UInt64, u64, Varint, None, read_uint64, write_uint64_no_tag, varint64_size);
scalar_kind!(
    /// `sint32`: zigzag varint
    SInt32, i32, Varint, None, read_sint32, write_sint32_no_tag, |v| varint32_size(zigzag_encode32(v))
);
scalar_kind!(
    /// `sint64`: zigzag varint
    SInt64, i64, Varint, None, read_sint64, write_sint64_no_tag, |v| varint64_size(zigzag_encode64(v))
);
scalar_kind!(Fixed32, u32, Fixed32, Some(4), read_fixed32, write_fixed32_no_tag, |_| 4);
scalar_kind!(Fixed64, u64, Fixed64, Some(8), read_fixed64, write_fixed64_no_tag, |_| 8);
scalar_kind!(SFixed32, i32, Fixed32, Some(4), read_sfixed32, write_sfixed32_no_tag, |_| 4);
scalar_kind!(SFixed64, i64, Fixed64, Some(8), read_sfixed64, write_sfixed64_no_tag, |_| 8);
scalar_kind!(Bool, bool, Varint, Some(1), read_bool, write_bool_no_tag, |_| 1);

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<K: ScalarKind>(value: K::Value) -> Vec<u8> {
        let mut out = Vec::new();
        let mut sink = Sink::new(&mut out);
        K::write(&mut sink, value).unwrap();
        out
    }

    fn decode<K: ScalarKind>(bytes: &[u8]) -> K::Value {
        let mut source = Source::from_slice(bytes);
        K::read(&mut source).unwrap()
    }

    #[test]
    fn test_sizes_match_encodings() {
        assert_eq!(encode::<Int32>(-1).len(), Int32::encoded_size(-1));
        assert_eq!(encode::<Int32>(-1).len(), 10);
        assert_eq!(encode::<SInt32>(-1), [0x01]);
        assert_eq!(encode::<SInt64>(-2), [0x03]);
        assert_eq!(encode::<UInt32>(300), [0xAC, 0x02]);
        assert_eq!(encode::<Fixed32>(1), [1, 0, 0, 0]);
        assert_eq!(encode::<SFixed64>(-1), [0xFF; 8]);
        assert_eq!(encode::<Bool>(true), [1]);
        assert_eq!(encode::<Double>(1.5).len(), Double::FIXED_SIZE.unwrap());
    }

    #[test]
    fn test_decode_values() {
        assert_eq!(decode::<SInt32>(&[0x03]), -2);
        assert_eq!(decode::<Int64>(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]), -1);
        assert_eq!(decode::<Float>(&encode::<Float>(-0.25)), -0.25);
        assert_eq!(decode::<SFixed32>(&[0xFE, 0xFF, 0xFF, 0xFF]), -2);
    }

    #[test]
    fn test_float_sameness_is_bitwise() {
        assert!(f32::NAN.same(f32::NAN));
        assert!(!0.0f64.same(-0.0));
        assert!(7i32.same(7));
    }
}
