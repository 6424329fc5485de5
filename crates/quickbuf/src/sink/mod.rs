// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encode engine.
//!
//! [`Sink`] emits tagged fields over a [`WriteBackend`]. Length prefixes
//! of sub-messages come from their cached sizes, so a message is written
//! in one pass after [`crate::ProtoMessage::compute_serialized_size`].

mod backend;

use std::io::Write;

pub use backend::{BufMutSink, SliceSink, StreamSink, WriteBackend};

use crate::config::MAX_VARINT64_BYTES;
use crate::error::Result;
use crate::kind::{ProtoEnum, ScalarKind};
use crate::message::ProtoMessage;
use crate::repeated::{RepeatedBytes, RepeatedMessage, RepeatedString};
use crate::size;
use crate::wire::{make_tag, zigzag_encode32, zigzag_encode64, WireType};

/// Protobuf encoder over a byte backend.
#[derive(Debug)]
pub struct Sink<B> {
    backend: B,
}

impl<'a> Sink<SliceSink<'a>> {
    pub fn from_slice(buf: &'a mut [u8]) -> Self {
        Self::new(SliceSink::new(buf))
    }
}

impl<'a> Sink<&'a mut Vec<u8>> {
    /// Appends to `out`, growing it as needed.
    pub fn from_vec(out: &'a mut Vec<u8>) -> Self {
        Self::new(out)
    }
}

impl<W: Write> Sink<StreamSink<W>> {
    pub fn from_writer(writer: W) -> Self {
        Self::new(StreamSink::new(writer))
    }
}

impl<T: bytes::BufMut> Sink<BufMutSink<T>> {
    pub fn from_buf_mut(buf: T) -> Self {
        Self::new(BufMutSink::new(buf))
    }
}

impl<B: WriteBackend> Sink<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Swaps in a new backend, returning the old one.
    pub fn wrap(&mut self, backend: B) -> B {
        core::mem::replace(&mut self.backend, backend)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.backend.position()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.backend.flush()
    }

    // -------------------------------------------------------------------
    // Raw writes
    // -------------------------------------------------------------------

    #[inline]
    pub fn write_raw_byte(&mut self, byte: u8) -> Result<()> {
        self.backend.write_byte(byte)
    }

    #[inline]
    pub fn write_raw_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.backend.write_all(data)
    }

    #[inline]
    pub fn write_raw_varint32(&mut self, value: u32) -> Result<()> {
        if value < 0x80 {
            return self.backend.write_byte(value as u8);
        }
        self.write_raw_varint64(u64::from(value))
    }

    pub fn write_raw_varint64(&mut self, mut value: u64) -> Result<()> {
        let mut buf = [0u8; MAX_VARINT64_BYTES];
        let mut len = 0;
        while value >= 0x80 {
            buf[len] = (value as u8) | 0x80;
            value >>= 7;
            len += 1;
        }
        buf[len] = value as u8;
        self.backend.write_all(&buf[..=len])
    }

    #[inline]
    pub fn write_raw_le32(&mut self, value: u32) -> Result<()> {
        self.backend.write_all(&value.to_le_bytes())
    }

    #[inline]
    pub fn write_raw_le64(&mut self, value: u64) -> Result<()> {
        self.backend.write_all(&value.to_le_bytes())
    }

    #[inline]
    pub fn write_tag(&mut self, field_number: u32, wire_type: WireType) -> Result<()> {
        self.write_raw_varint32(make_tag(field_number, wire_type))
    }

    #[inline]
    fn write_length(&mut self, length: usize) -> Result<()> {
        self.write_raw_varint64(length as u64)
    }

    // -------------------------------------------------------------------
    // Typed values (no tag)
    // -------------------------------------------------------------------

    #[inline]
    pub fn write_double_no_tag(&mut self, value: f64) -> Result<()> {
        self.write_raw_le64(value.to_bits())
    }

    #[inline]
    pub fn write_float_no_tag(&mut self, value: f32) -> Result<()> {
        self.write_raw_le32(value.to_bits())
    }

    /// Negative values are sign-extended to 64 bits (10 bytes).
    /// Readers also accept the 5-byte form, but it is never written.
    #[inline]
    pub fn write_int32_no_tag(&mut self, value: i32) -> Result<()> {
        if value >= 0 {
            self.write_raw_varint32(value as u32)
        } else {
            self.write_raw_varint64(value as i64 as u64)
        }
    }

    #[inline]
    pub fn write_int64_no_tag(&mut self, value: i64) -> Result<()> {
        self.write_raw_varint64(value as u64)
    }

    #[inline]
    pub fn write_uint32_no_tag(&mut self, value: u32) -> Result<()> {
        self.write_raw_varint32(value)
    }

    #[inline]
    pub fn write_uint64_no_tag(&mut self, value: u64) -> Result<()> {
        self.write_raw_varint64(value)
    }

    #[inline]
    pub fn write_sint32_no_tag(&mut self, value: i32) -> Result<()> {
        self.write_raw_varint32(zigzag_encode32(value))
    }

    #[inline]
    pub fn write_sint64_no_tag(&mut self, value: i64) -> Result<()> {
        self.write_raw_varint64(zigzag_encode64(value))
    }

    #[inline]
    pub fn write_fixed32_no_tag(&mut self, value: u32) -> Result<()> {
        self.write_raw_le32(value)
    }

    #[inline]
    pub fn write_fixed64_no_tag(&mut self, value: u64) -> Result<()> {
        self.write_raw_le64(value)
    }

    #[inline]
    pub fn write_sfixed32_no_tag(&mut self, value: i32) -> Result<()> {
        self.write_raw_le32(value as u32)
    }

    #[inline]
    pub fn write_sfixed64_no_tag(&mut self, value: i64) -> Result<()> {
        self.write_raw_le64(value as u64)
    }

    #[inline]
    pub fn write_bool_no_tag(&mut self, value: bool) -> Result<()> {
        self.backend.write_byte(u8::from(value))
    }

    // -------------------------------------------------------------------
    // Tagged fields
    // -------------------------------------------------------------------

    /// Writes one tag + value pair with the strategy `K`.
    #[inline]
    pub fn write_field<K: ScalarKind>(&mut self, field_number: u32, value: K::Value) -> Result<()> {
        self.write_tag(field_number, K::WIRE_TYPE)?;
        K::write(self, value)
    }

    /// One tag, one length, then the concatenated values. Nothing for an empty slice.
    pub fn write_packed<K: ScalarKind>(&mut self, field_number: u32, values: &[K::Value]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.write_tag(field_number, WireType::LengthDelimited)?;
        self.write_length(size::packed_payload::<K>(values))?;
        for value in values {
            K::write(self, *value)?;
        }
        Ok(())
    }

    /// One tag + value pair per element.
    pub fn write_repeated<K: ScalarKind>(&mut self, field_number: u32, values: &[K::Value]) -> Result<()> {
        for value in values {
            self.write_field::<K>(field_number, *value)?;
        }
        Ok(())
    }

    pub fn write_enum<E: ProtoEnum>(&mut self, field_number: u32, value: E) -> Result<()> {
        self.write_tag(field_number, WireType::Varint)?;
        self.write_int32_no_tag(value.number())
    }

    pub fn write_packed_enum<E: ProtoEnum>(&mut self, field_number: u32, values: &[E]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.write_tag(field_number, WireType::LengthDelimited)?;
        self.write_length(size::packed_enum_payload(values))?;
        for value in values {
            self.write_int32_no_tag(value.number())?;
        }
        Ok(())
    }

    pub fn write_repeated_enum<E: ProtoEnum>(&mut self, field_number: u32, values: &[E]) -> Result<()> {
        for value in values {
            self.write_enum(field_number, *value)?;
        }
        Ok(())
    }

    pub fn write_string(&mut self, field_number: u32, value: &str) -> Result<()> {
        self.write_bytes(field_number, value.as_bytes())
    }

    pub fn write_bytes(&mut self, field_number: u32, value: &[u8]) -> Result<()> {
        self.write_tag(field_number, WireType::LengthDelimited)?;
        self.write_length(value.len())?;
        self.write_raw_bytes(value)
    }

    /// Length-prefixed sub-message, using its cached size when valid.
    pub fn write_message<M: ProtoMessage>(&mut self, field_number: u32, message: &M) -> Result<()> {
        self.write_tag(field_number, WireType::LengthDelimited)?;
        self.write_length(message.serialized_size())?;
        message.write_to(self)
    }

    pub fn write_group<M: ProtoMessage>(&mut self, field_number: u32, message: &M) -> Result<()> {
        self.write_tag(field_number, WireType::StartGroup)?;
        message.write_to(self)?;
        self.write_tag(field_number, WireType::EndGroup)
    }

    pub fn write_repeated_strings(&mut self, field_number: u32, values: &RepeatedString) -> Result<()> {
        for value in values {
            self.write_string(field_number, value)?;
        }
        Ok(())
    }

    pub fn write_repeated_bytes(&mut self, field_number: u32, values: &RepeatedBytes) -> Result<()> {
        for value in values {
            self.write_bytes(field_number, value)?;
        }
        Ok(())
    }

    pub fn write_repeated_messages<M: ProtoMessage>(
        &mut self,
        field_number: u32,
        values: &RepeatedMessage<M>,
    ) -> Result<()> {
        for value in values {
            self.write_message(field_number, value)?;
        }
        Ok(())
    }

    pub fn write_repeated_groups<M: ProtoMessage>(
        &mut self,
        field_number: u32,
        values: &RepeatedMessage<M>,
    ) -> Result<()> {
        for value in values {
            self.write_group(field_number, value)?;
        }
        Ok(())
    }
}
