// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decode engine.
//!
//! [`Source`] layers the protobuf reading protocol over a [`ReadBackend`]:
//! tag dispatch, byte limits framing nested messages, the recursion bound,
//! field skipping and unknown-field retention.
//!
//! # Example
//!
//! ```
//! use quickbuf::Source;
//!
//! let mut input = Source::from_slice(&[0x08, 0x96, 0x01]);
//! assert_eq!(input.read_tag().unwrap(), 0x08);
//! assert_eq!(input.read_int32().unwrap(), 150);
//! assert_eq!(input.read_tag().unwrap(), 0);
//! ```

mod backend;
mod lookahead;

use std::io::BufRead;

pub use backend::{BufBackend, ReadBackend, SliceBackend, StreamBackend};

use crate::config::{SourceConfig, MAX_VARINT64_BYTES};
use crate::error::{Error, Result};
use crate::kind::{ProtoEnum, ScalarKind};
use crate::message::ProtoMessage;
use crate::repeated::{Repeated, RepeatedBytes, RepeatedMessage, RepeatedString};
use crate::wire::{
    make_tag, push_varint32, push_varint64, tag_field_number, tag_wire_type, zigzag_decode32,
    zigzag_decode64, WireType,
};

/// No limit pushed.
const NO_LIMIT: usize = usize::MAX;

/// Protobuf decoder over a byte backend.
///
/// One instance decodes one input at a time; reuse it with
/// [`Source::wrap`] instead of reallocating.
#[derive(Debug)]
pub struct Source<B> {
    backend: B,
    current_limit: usize,
    last_tag: u32,
    recursion_depth: u32,
    config: SourceConfig,
}

impl<'a> Source<SliceBackend<'a>> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(SliceBackend::new(data))
    }
}

impl<R: BufRead> Source<StreamBackend<R>> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(StreamBackend::new(reader))
    }
}

impl<T: bytes::Buf> Source<BufBackend<T>> {
    pub fn from_buf(buf: T) -> Self {
        Self::new(BufBackend::new(buf))
    }
}

impl<B: ReadBackend> Source<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SourceConfig::default())
    }

    pub fn with_config(backend: B, config: SourceConfig) -> Self {
        Self {
            backend,
            current_limit: NO_LIMIT,
            last_tag: 0,
            recursion_depth: 0,
            config,
        }
    }

    /// Swaps in a new backend and resets the decoding state; returns the old backend.
    pub fn wrap(&mut self, backend: B) -> B {
        self.reset();
        core::mem::replace(&mut self.backend, backend)
    }

    /// Clears limits, the last tag and the recursion depth. The configuration stays.
    pub fn reset(&mut self) {
        self.current_limit = NO_LIMIT;
        self.last_tag = 0;
        self.recursion_depth = 0;
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Sets the maximum nesting depth, returning the previous one.
    pub fn set_recursion_limit(&mut self, limit: u32) -> u32 {
        core::mem::replace(&mut self.config.recursion_limit, limit)
    }

    /// Drops unknown fields even for messages that retain them.
    pub fn discard_unknown_fields(&mut self, discard: bool) {
        self.config.discard_unknown_fields = discard;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.backend.position()
    }

    // -------------------------------------------------------------------
    // Limits
    // -------------------------------------------------------------------

    /// Limits reads to the next `byte_limit` bytes; returns the previous
    /// limit for [`Source::pop_limit`].
    ///
    /// Fails if the new limit would extend past the current one.
    pub fn push_limit(&mut self, byte_limit: usize) -> Result<usize> {
        let new_limit = self
            .position()
            .checked_add(byte_limit)
            .ok_or(Error::TruncatedInput)?;
        if new_limit > self.current_limit {
            log::debug!(
                "[Source] limit {} exceeds enclosing limit {}",
                new_limit,
                self.current_limit
            );
            return Err(Error::TruncatedInput);
        }
        Ok(core::mem::replace(&mut self.current_limit, new_limit))
    }

    #[inline]
    pub fn pop_limit(&mut self, old_limit: usize) {
        self.current_limit = old_limit;
    }

    /// Bytes left before the current limit, `None` when no limit is pushed.
    pub fn bytes_until_limit(&self) -> Option<usize> {
        if self.current_limit == NO_LIMIT {
            None
        } else {
            Some(self.current_limit - self.position())
        }
    }

    /// True at the end of the data or at the current limit.
    #[inline]
    pub fn is_at_end(&mut self) -> Result<bool> {
        Ok(self.position() >= self.current_limit || !self.backend.has_remaining()?)
    }

    /// Fails unless every byte up to the current limit was consumed; a
    /// span that claims more bytes than the input holds ends early.
    pub fn check_limit_reached(&self) -> Result<()> {
        if self.current_limit != NO_LIMIT && self.position() < self.current_limit {
            log::debug!(
                "[Source] input ended at {} inside a span ending at {}",
                self.position(),
                self.current_limit
            );
            return Err(Error::TruncatedInput);
        }
        Ok(())
    }

    #[inline]
    fn ensure_within_limit(&self, count: usize) -> Result<()> {
        match self.position().checked_add(count) {
            Some(end) if end <= self.current_limit => Ok(()),
            _ => Err(Error::TruncatedInput),
        }
    }

    // -------------------------------------------------------------------
    // Tags
    // -------------------------------------------------------------------

    /// Reads the next tag; 0 means no more fields (end of data or limit).
    pub fn read_tag(&mut self) -> Result<u32> {
        if self.is_at_end()? {
            self.last_tag = 0;
            return Ok(0);
        }
        let tag = self.read_raw_varint32()?;
        self.last_tag = tag;
        if tag_field_number(tag) == 0 || WireType::from_raw(tag_wire_type(tag)).is_none() {
            log::debug!("[Source] invalid tag {:#x} at offset {}", tag, self.position());
            return Err(Error::InvalidTag { tag });
        }
        Ok(tag)
    }

    /// Tag returned by the last [`Source::read_tag`] call.
    pub fn last_tag(&self) -> u32 {
        self.last_tag
    }

    /// Verifies that the last tag read was `tag` (0 for the end of a message).
    pub fn check_last_tag_was(&self, tag: u32) -> Result<()> {
        if self.last_tag == tag {
            Ok(())
        } else {
            log::debug!("[Source] expected end tag {:#x}, got {:#x}", tag, self.last_tag);
            Err(Error::InvalidEndTag)
        }
    }

    // -------------------------------------------------------------------
    // Recursion
    // -------------------------------------------------------------------

    fn enter_recursion(&mut self) -> Result<()> {
        if self.recursion_depth >= self.config.recursion_limit {
            log::debug!(
                "[Source] recursion limit {} exceeded",
                self.config.recursion_limit
            );
            return Err(Error::RecursionLimitExceeded {
                limit: self.config.recursion_limit,
            });
        }
        self.recursion_depth += 1;
        Ok(())
    }

    #[inline]
    fn exit_recursion(&mut self) {
        self.recursion_depth -= 1;
    }

    // -------------------------------------------------------------------
    // Skipping and unknown fields
    // -------------------------------------------------------------------

    /// Discards the payload of the field whose tag was just read.
    ///
    /// Returns `false` for an end-group tag: the enclosing group is done.
    pub fn skip_field(&mut self, tag: u32) -> Result<bool> {
        match WireType::from_raw(tag_wire_type(tag)) {
            Some(WireType::Varint) => {
                self.read_raw_varint64()?;
            }
            Some(WireType::Fixed64) => self.skip_raw_bytes(8)?,
            Some(WireType::LengthDelimited) => {
                let length = self.read_length()?;
                self.skip_raw_bytes(length)?;
            }
            Some(WireType::StartGroup) => {
                self.enter_recursion()?;
                let result = self.skip_message();
                self.exit_recursion();
                result?;
                self.check_last_tag_was(make_tag(tag_field_number(tag), WireType::EndGroup))?;
            }
            Some(WireType::EndGroup) => return Ok(false),
            Some(WireType::Fixed32) => self.skip_raw_bytes(4)?,
            None => return Err(Error::InvalidTag { tag }),
        }
        Ok(true)
    }

    /// Skips fields until tag 0 or an end-group tag.
    pub fn skip_message(&mut self) -> Result<()> {
        loop {
            let tag = self.read_tag()?;
            if tag == 0 || !self.skip_field(tag)? {
                return Ok(());
            }
        }
    }

    /// Like [`Source::skip_field`], but appends the tag and payload bytes
    /// verbatim to `unknown` unless unknown fields are being discarded.
    ///
    /// Nothing is appended if the field fails to decode.
    pub fn skip_field_retaining(&mut self, tag: u32, unknown: &mut Vec<u8>) -> Result<bool> {
        if self.config.discard_unknown_fields {
            log::trace!("[Source] discarding unknown field tag {:#x}", tag);
            return self.skip_field(tag);
        }
        let wire_type = WireType::from_raw(tag_wire_type(tag));
        if wire_type == Some(WireType::EndGroup) {
            return Ok(false);
        }
        log::trace!("[Source] retaining unknown field tag {:#x}", tag);
        let start = unknown.len();
        let result = self.retain_field(tag, wire_type, unknown);
        if result.is_err() {
            unknown.truncate(start);
        }
        result.map(|()| true)
    }

    fn retain_field(&mut self, tag: u32, wire_type: Option<WireType>, unknown: &mut Vec<u8>) -> Result<()> {
        push_varint32(unknown, tag);
        match wire_type {
            Some(WireType::Varint) => {
                self.copy_raw_varint(unknown)?;
            }
            Some(WireType::Fixed64) => self.read_into_vec(8, unknown)?,
            Some(WireType::LengthDelimited) => {
                let length = self.copy_length(unknown)?;
                self.read_into_vec(length, unknown)?;
            }
            Some(WireType::StartGroup) => {
                let end_tag = make_tag(tag_field_number(tag), WireType::EndGroup);
                self.enter_recursion()?;
                let result = self.skip_message_retaining(unknown);
                self.exit_recursion();
                result?;
                self.check_last_tag_was(end_tag)?;
                push_varint32(unknown, end_tag);
            }
            Some(WireType::Fixed32) => self.read_into_vec(4, unknown)?,
            Some(WireType::EndGroup) | None => return Err(Error::InvalidTag { tag }),
        }
        Ok(())
    }

    /// Like [`Source::skip_message`], retaining every skipped field.
    pub fn skip_message_retaining(&mut self, unknown: &mut Vec<u8>) -> Result<()> {
        loop {
            let tag = self.read_tag()?;
            if tag == 0 || !self.skip_field_retaining(tag, unknown)? {
                return Ok(());
            }
        }
    }

    /// Retains an enum number with no matching variant, re-encoded as `tag + varint`.
    pub fn skip_enum(&mut self, tag: u32, value: i32, unknown: &mut Vec<u8>) {
        if self.config.discard_unknown_fields {
            return;
        }
        log::trace!("[Source] retaining unknown enum value {} (tag {:#x})", value, tag);
        push_varint32(unknown, tag);
        push_varint64(unknown, value as i64 as u64);
    }

    /// Reads a varint, appending its raw bytes to `out`.
    fn copy_raw_varint(&mut self, out: &mut Vec<u8>) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT64_BYTES {
            let byte = self.read_raw_byte()?;
            out.push(byte);
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte < 0x80 {
                return Ok(value);
            }
        }
        log::debug!("[Source] malformed varint at offset {}", self.position());
        Err(Error::MalformedVarint)
    }

    fn copy_length(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let raw = self.copy_raw_varint(out)? as u32;
        if (raw as i32) < 0 {
            return Err(Error::NegativeSize);
        }
        Ok(raw as usize)
    }

    // -------------------------------------------------------------------
    // Raw reads
    // -------------------------------------------------------------------

    #[inline]
    pub fn read_raw_byte(&mut self) -> Result<u8> {
        if self.position() >= self.current_limit {
            return Err(Error::TruncatedInput);
        }
        self.backend.read_byte()
    }

    /// Fills `dst` completely.
    pub fn read_raw_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        self.ensure_within_limit(dst.len())?;
        self.backend.read_exact(dst)
    }

    pub fn skip_raw_bytes(&mut self, count: usize) -> Result<()> {
        self.ensure_within_limit(count)?;
        self.backend.skip(count)
    }

    fn read_into_vec(&mut self, count: usize, dst: &mut Vec<u8>) -> Result<()> {
        self.ensure_within_limit(count)?;
        self.backend.append_to(count, dst)
    }

    /// Reads a varint of up to 10 bytes, keeping the low 32 bits.
    pub fn read_raw_varint32(&mut self) -> Result<u32> {
        let first = self.read_raw_byte()?;
        if first < 0x80 {
            return Ok(u32::from(first));
        }
        let mut value = u32::from(first & 0x7F);
        for shift in [7u32, 14, 21, 28] {
            let byte = self.read_raw_byte()?;
            value |= u32::from(byte & 0x7F) << shift;
            if byte < 0x80 {
                return Ok(value);
            }
        }
        // sign-extended negative int32: discard the upper bytes
        for _ in 5..MAX_VARINT64_BYTES {
            if self.read_raw_byte()? < 0x80 {
                return Ok(value);
            }
        }
        log::debug!("[Source] malformed varint at offset {}", self.position());
        Err(Error::MalformedVarint)
    }

    pub fn read_raw_varint64(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT64_BYTES {
            let byte = self.read_raw_byte()?;
            value |= u64::from(byte & 0x7F) << (7 * i);
            if byte < 0x80 {
                return Ok(value);
            }
        }
        log::debug!("[Source] malformed varint at offset {}", self.position());
        Err(Error::MalformedVarint)
    }

    pub fn read_raw_le32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.read_raw_bytes(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_raw_le64(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        self.read_raw_bytes(&mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads a length prefix.
    pub fn read_length(&mut self) -> Result<usize> {
        let raw = self.read_raw_varint32()?;
        if (raw as i32) < 0 {
            log::debug!("[Source] negative length {}", raw as i32);
            return Err(Error::NegativeSize);
        }
        Ok(raw as usize)
    }

    // -------------------------------------------------------------------
    // Typed values (no tag)
    // -------------------------------------------------------------------

    #[inline]
    pub fn read_double(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_raw_le64()?))
    }

    #[inline]
    pub fn read_float(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_raw_le32()?))
    }

    #[inline]
    pub fn read_int32(&mut self) -> Result<i32> {
        Ok(self.read_raw_varint32()? as i32)
    }

    #[inline]
    pub fn read_int64(&mut self) -> Result<i64> {
        Ok(self.read_raw_varint64()? as i64)
    }

    #[inline]
    pub fn read_uint32(&mut self) -> Result<u32> {
        self.read_raw_varint32()
    }

    #[inline]
    pub fn read_uint64(&mut self) -> Result<u64> {
        self.read_raw_varint64()
    }

    #[inline]
    pub fn read_sint32(&mut self) -> Result<i32> {
        Ok(zigzag_decode32(self.read_raw_varint32()?))
    }

    #[inline]
    pub fn read_sint64(&mut self) -> Result<i64> {
        Ok(zigzag_decode64(self.read_raw_varint64()?))
    }

    #[inline]
    pub fn read_fixed32(&mut self) -> Result<u32> {
        self.read_raw_le32()
    }

    #[inline]
    pub fn read_fixed64(&mut self) -> Result<u64> {
        self.read_raw_le64()
    }

    #[inline]
    pub fn read_sfixed32(&mut self) -> Result<i32> {
        Ok(self.read_raw_le32()? as i32)
    }

    #[inline]
    pub fn read_sfixed64(&mut self) -> Result<i64> {
        Ok(self.read_raw_le64()? as i64)
    }

    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_raw_varint64()? != 0)
    }

    /// Raw enum number; mapping to a variant is the caller's job.
    #[inline]
    pub fn read_enum_number(&mut self) -> Result<i32> {
        self.read_int32()
    }

    /// Reads one value with the strategy `K`.
    #[inline]
    pub fn read<K: ScalarKind>(&mut self) -> Result<K::Value> {
        K::read(self)
    }

    /// Replaces `store` with a length-delimited UTF-8 string.
    ///
    /// On failure `store` keeps its previous contents.
    pub fn read_string(&mut self, store: &mut String) -> Result<()> {
        let length = self.read_length()?;
        let mut bytes = core::mem::take(store).into_bytes();
        let start = bytes.len();
        let mut result = self.read_into_vec(length, &mut bytes);
        if result.is_ok() && core::str::from_utf8(&bytes[start..]).is_err() {
            log::debug!("[Source] invalid UTF-8 in string field");
            result = Err(Error::InvalidUtf8);
        }
        if result.is_ok() {
            bytes.drain(..start);
        } else {
            bytes.truncate(start);
        }
        // Both branches leave valid UTF-8 behind.
        *store = String::from_utf8(bytes).unwrap_or_default();
        result
    }

    /// Replaces `store` with a length-delimited byte string.
    ///
    /// On failure `store` keeps its previous contents.
    pub fn read_bytes(&mut self, store: &mut Vec<u8>) -> Result<()> {
        let length = self.read_length()?;
        let start = store.len();
        match self.read_into_vec(length, store) {
            Ok(()) => {
                store.drain(..start);
                Ok(())
            }
            Err(err) => {
                store.truncate(start);
                Err(err)
            }
        }
    }

    // -------------------------------------------------------------------
    // Nested messages
    // -------------------------------------------------------------------

    /// Merges a length-delimited sub-message into `message`.
    ///
    /// The limit and the recursion depth are restored on failure too.
    pub fn read_message<M: ProtoMessage>(&mut self, message: &mut M) -> Result<()> {
        let length = self.read_length()?;
        let old_limit = self.push_limit(length)?;
        let mut result = self.merge_nested(message, 0);
        if result.is_ok() {
            result = self.check_limit_reached();
        }
        self.pop_limit(old_limit);
        result
    }

    /// Merges a group (start tag already read) into `message`.
    pub fn read_group<M: ProtoMessage>(&mut self, message: &mut M, field_number: u32) -> Result<()> {
        self.merge_nested(message, make_tag(field_number, WireType::EndGroup))
    }

    fn merge_nested<M: ProtoMessage>(&mut self, message: &mut M, end_tag: u32) -> Result<()> {
        self.enter_recursion()?;
        let mut result = message.merge_from(self);
        if result.is_ok() {
            result = self.check_last_tag_was(end_tag);
        }
        self.exit_recursion();
        result
    }

    // -------------------------------------------------------------------
    // Repeated fields
    // -------------------------------------------------------------------

    /// Reads a packed span of `K` values, appending them to `store`.
    ///
    /// Nothing is appended if the span fails to decode.
    pub fn read_packed<K: ScalarKind>(&mut self, store: &mut Repeated<K::Value>) -> Result<()> {
        let length = self.read_length()?;
        let old_limit = self.push_limit(length)?;
        let start = store.len();
        self.reserve_packed(store, length, K::FIXED_SIZE);
        let result = self.fill_packed::<K>(store);
        if result.is_err() {
            store.truncate(start);
        }
        self.pop_limit(old_limit);
        result
    }

    fn fill_packed<K: ScalarKind>(&mut self, store: &mut Repeated<K::Value>) -> Result<()> {
        while !self.is_at_end()? {
            store.push(K::read(self)?);
        }
        self.check_limit_reached()
    }

    /// Reads non-packed `K` values for as long as the next tag is `tag`.
    ///
    /// The value of the first element follows. Returns the tag that ended
    /// the run, which the caller must dispatch instead of reading a new one.
    pub fn read_repeated<K: ScalarKind>(&mut self, store: &mut Repeated<K::Value>, tag: u32) -> Result<u32> {
        loop {
            self.reserve_repeated(store, tag);
            store.push(K::read(self)?);
            let next = self.read_tag()?;
            if next != tag {
                return Ok(next);
            }
        }
    }

    /// Packed enum span. Numbers without a variant go to `unknown` as
    /// non-packed `tag + varint` entries, or are dropped when it is `None`.
    pub fn read_packed_enum<E: ProtoEnum>(
        &mut self,
        store: &mut Repeated<E>,
        tag: u32,
        mut unknown: Option<&mut Vec<u8>>,
    ) -> Result<()> {
        let length = self.read_length()?;
        let old_limit = self.push_limit(length)?;
        let start = store.len();
        let unknown_start = unknown.as_deref().map_or(0, Vec::len);
        self.reserve_packed(store, length, None);
        let result = self.fill_packed_enum(store, tag, unknown.as_deref_mut());
        if result.is_err() {
            store.truncate(start);
            if let Some(buf) = unknown {
                buf.truncate(unknown_start);
            }
        }
        self.pop_limit(old_limit);
        result
    }

    fn fill_packed_enum<E: ProtoEnum>(
        &mut self,
        store: &mut Repeated<E>,
        tag: u32,
        mut unknown: Option<&mut Vec<u8>>,
    ) -> Result<()> {
        while !self.is_at_end()? {
            let value = self.read_enum_number()?;
            match E::from_number(value) {
                Some(variant) => store.push(variant),
                None => {
                    if let Some(buf) = unknown.as_deref_mut() {
                        self.skip_enum(tag, value, buf);
                    }
                }
            }
        }
        self.check_limit_reached()
    }

    /// Non-packed enum run; see [`Source::read_repeated`] and [`Source::read_packed_enum`].
    pub fn read_repeated_enum<E: ProtoEnum>(
        &mut self,
        store: &mut Repeated<E>,
        tag: u32,
        mut unknown: Option<&mut Vec<u8>>,
    ) -> Result<u32> {
        loop {
            self.reserve_repeated(store, tag);
            let value = self.read_enum_number()?;
            match E::from_number(value) {
                Some(variant) => store.push(variant),
                None => {
                    if let Some(buf) = unknown.as_deref_mut() {
                        self.skip_enum(tag, value, buf);
                    }
                }
            }
            let next = self.read_tag()?;
            if next != tag {
                return Ok(next);
            }
        }
    }

    pub fn read_repeated_strings(&mut self, store: &mut RepeatedString, tag: u32) -> Result<u32> {
        loop {
            self.reserve_repeated(store, tag);
            if let Err(err) = self.read_string(store.next_mut()) {
                store.truncate(store.len() - 1);
                return Err(err);
            }
            let next = self.read_tag()?;
            if next != tag {
                return Ok(next);
            }
        }
    }

    pub fn read_repeated_bytes(&mut self, store: &mut RepeatedBytes, tag: u32) -> Result<u32> {
        loop {
            self.reserve_repeated(store, tag);
            if let Err(err) = self.read_bytes(store.next_mut()) {
                store.truncate(store.len() - 1);
                return Err(err);
            }
            let next = self.read_tag()?;
            if next != tag {
                return Ok(next);
            }
        }
    }

    pub fn read_repeated_messages<M: ProtoMessage>(
        &mut self,
        store: &mut RepeatedMessage<M>,
        tag: u32,
    ) -> Result<u32> {
        loop {
            self.reserve_repeated(store, tag);
            if let Err(err) = self.read_message(store.next_mut()) {
                store.truncate(store.len() - 1);
                return Err(err);
            }
            let next = self.read_tag()?;
            if next != tag {
                return Ok(next);
            }
        }
    }

    pub fn read_repeated_groups<M: ProtoMessage>(
        &mut self,
        store: &mut RepeatedMessage<M>,
        tag: u32,
    ) -> Result<u32> {
        let field_number = tag_field_number(tag);
        loop {
            self.reserve_repeated(store, tag);
            if let Err(err) = self.read_group(store.next_mut(), field_number) {
                store.truncate(store.len() - 1);
                return Err(err);
            }
            let next = self.read_tag()?;
            if next != tag {
                return Ok(next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Fixed32, SInt64, UInt32};

    #[test]
    fn test_read_tag_end_and_invalid() {
        let mut input = Source::from_slice(&[]);
        assert_eq!(input.read_tag().unwrap(), 0);

        // field number 0
        let mut input = Source::from_slice(&[0x00]);
        assert!(matches!(input.read_tag(), Err(Error::InvalidTag { tag: 0 })));

        // wire type 7
        let mut input = Source::from_slice(&[0x0F]);
        assert!(matches!(input.read_tag(), Err(Error::InvalidTag { tag: 0x0F })));
    }

    #[test]
    fn test_varint32_discards_sign_extension() {
        let mut input = Source::from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        assert_eq!(input.read_int32().unwrap(), -1);
        assert_eq!(input.position(), 10);

        let mut input = Source::from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(input.read_int32().unwrap(), -1);
    }

    #[test]
    fn test_malformed_varint() {
        let bytes = [0xFFu8; 11];
        let mut input = Source::from_slice(&bytes);
        assert!(matches!(input.read_raw_varint64(), Err(Error::MalformedVarint)));
        let mut input = Source::from_slice(&bytes);
        assert!(matches!(input.read_raw_varint32(), Err(Error::MalformedVarint)));
    }

    #[test]
    fn test_truncated_varint() {
        let mut input = Source::from_slice(&[0x80, 0x80]);
        assert!(input.read_raw_varint64().unwrap_err().is_truncation());
    }

    #[test]
    fn test_limits() {
        let data = [1u8, 2, 3, 4, 5];
        let mut input = Source::from_slice(&data);
        assert_eq!(input.bytes_until_limit(), None);

        let outer = input.push_limit(4).unwrap();
        assert_eq!(outer, usize::MAX);
        assert_eq!(input.bytes_until_limit(), Some(4));

        // nested limit may not exceed the enclosing one
        assert!(input.push_limit(5).unwrap_err().is_truncation());
        let inner = input.push_limit(2).unwrap();
        input.skip_raw_bytes(2).unwrap();
        assert!(input.is_at_end().unwrap());
        assert_eq!(input.read_tag().unwrap(), 0);
        assert!(input.read_raw_byte().unwrap_err().is_truncation());

        input.pop_limit(inner);
        assert!(!input.is_at_end().unwrap());
        assert!(input.skip_raw_bytes(3).unwrap_err().is_truncation());
        input.pop_limit(outer);
        input.skip_raw_bytes(3).unwrap();
        assert!(input.is_at_end().unwrap());
    }

    #[test]
    fn test_limit_past_end_of_input() {
        let data = [0x08u8, 0x01];
        let mut input = Source::from_slice(&data);
        let outer = input.push_limit(5).unwrap();
        input.skip_raw_bytes(2).unwrap();
        assert!(input.is_at_end().unwrap());
        assert!(input.check_limit_reached().unwrap_err().is_truncation());
        input.pop_limit(outer);
        input.check_limit_reached().unwrap();
    }

    #[test]
    fn test_negative_length() {
        let mut input = Source::from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert!(matches!(input.read_length(), Err(Error::NegativeSize)));
    }

    #[test]
    fn test_skip_field_by_wire_type() {
        let data = [
            0x08, 0x96, 0x01, // 1: varint
            0x11, 1, 2, 3, 4, 5, 6, 7, 8, // 2: fixed64
            0x1A, 0x02, b'h', b'i', // 3: length-delimited
            0x23, 0x08, 0x01, 0x24, // 4: group { 1: 1 }
            0x2D, 1, 2, 3, 4, // 5: fixed32
            0x34, // 6: end group
        ];
        let mut input = Source::from_slice(&data);
        for _ in 0..5 {
            let tag = input.read_tag().unwrap();
            assert!(input.skip_field(tag).unwrap());
        }
        let tag = input.read_tag().unwrap();
        assert!(!input.skip_field(tag).unwrap());
        assert_eq!(input.read_tag().unwrap(), 0);
    }

    #[test]
    fn test_skip_group_mismatched_end() {
        // group 4 closed by end-group 5
        let mut input = Source::from_slice(&[0x23, 0x08, 0x01, 0x2C]);
        let tag = input.read_tag().unwrap();
        assert!(matches!(input.skip_field(tag), Err(Error::InvalidEndTag)));
    }

    #[test]
    fn test_retaining_copies_exact_bytes() {
        let data = [
            0x08, 0xFF, 0x80, 0x00, // non-canonical varint stays as is
            0x1A, 0x02, b'h', b'i', 0x23, 0x08, 0x01, 0x24, 0x2D, 1, 2, 3, 4,
        ];
        let mut input = Source::from_slice(&data);
        let mut unknown = Vec::new();
        loop {
            let tag = input.read_tag().unwrap();
            if tag == 0 {
                break;
            }
            assert!(input.skip_field_retaining(tag, &mut unknown).unwrap());
        }
        assert_eq!(unknown, data);
    }

    #[test]
    fn test_failed_retention_appends_nothing() {
        let cases: [&[u8]; 4] = [
            &[0x08, 0x80],                   // varint cut short
            &[0x1A, 0x05, b'a'],             // length past the end
            &[0x23, 0x08, 0x01, 0x1A, 0x09], // group with a truncated member
            &[0x23, 0x08, 0x01, 0x2C],       // group closed by the wrong tag
        ];
        for data in cases {
            let mut input = Source::from_slice(data);
            let mut unknown = vec![0x10, 0x01];
            let tag = input.read_tag().unwrap();
            assert!(input.skip_field_retaining(tag, &mut unknown).is_err(), "{data:02x?}");
            assert_eq!(unknown, [0x10, 0x01], "{data:02x?}");
            assert_eq!(input.recursion_depth, 0);
        }
    }

    #[test]
    fn test_discard_overrides_retention() {
        let mut input = Source::from_slice(&[0x08, 0x01]);
        input.discard_unknown_fields(true);
        let mut unknown = Vec::new();
        let tag = input.read_tag().unwrap();
        assert!(input.skip_field_retaining(tag, &mut unknown).unwrap());
        input.skip_enum(tag, 5, &mut unknown);
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_skip_enum_sign_extends() {
        let mut input = Source::from_slice(&[]);
        let mut unknown = Vec::new();
        input.skip_enum(0x08, -1, &mut unknown);
        assert_eq!(unknown.len(), 11);
        assert_eq!(unknown[0], 0x08);
    }

    #[test]
    fn test_nested_unknown_groups_respect_recursion_limit() {
        let mut data = Vec::new();
        for _ in 0..5 {
            data.push(0x0B); // start group 1
        }
        for _ in 0..5 {
            data.push(0x0C); // end group 1
        }

        let mut input = Source::from_slice(&data);
        input.set_recursion_limit(4);
        let tag = input.read_tag().unwrap();
        assert!(matches!(
            input.skip_field(tag),
            Err(Error::RecursionLimitExceeded { limit: 4 })
        ));

        assert_eq!(input.recursion_depth, 0);

        let mut input = Source::from_slice(&data);
        assert_eq!(input.set_recursion_limit(5), 64);
        let tag = input.read_tag().unwrap();
        assert!(input.skip_field(tag).unwrap());
        assert_eq!(input.read_tag().unwrap(), 0);
    }

    #[test]
    fn test_read_repeated_returns_breaking_tag() {
        let data = [0x08, 0x01, 0x08, 0x02, 0x08, 0x03, 0x10, 0x04];
        let mut input = Source::from_slice(&data);
        let mut store = Repeated::new();
        let tag = input.read_tag().unwrap();
        let next = input.read_repeated::<UInt32>(&mut store, tag).unwrap();
        assert_eq!(next, 0x10);
        assert_eq!(store.as_slice(), &[1, 2, 3]);
        assert_eq!(input.read_uint32().unwrap(), 4);
    }

    #[test]
    fn test_read_packed() {
        let data = [0x03, 0x01, 0x03, 0x05, 0x99];
        let mut input = Source::from_slice(&data);
        let mut store = Repeated::new();
        input.read_packed::<SInt64>(&mut store).unwrap();
        assert_eq!(store.as_slice(), &[-1, -2, -3]);
        assert_eq!(input.position(), 4);
    }

    #[test]
    fn test_packed_fixed_partial_element() {
        // 6 bytes cannot hold two fixed32 values
        let data = [0x06, 1, 0, 0, 0, 2, 0];
        let mut input = Source::from_slice(&data);
        let mut store = Repeated::new();
        assert!(input.read_packed::<Fixed32>(&mut store).unwrap_err().is_truncation());
    }

    #[test]
    fn test_read_string_and_bytes() {
        let mut input = Source::from_slice(&[0x02, b'o', b'k', 0x01, 0xFF, 0x03, 1]);
        let mut text = String::from("stale");
        input.read_string(&mut text).unwrap();
        assert_eq!(text, "ok");

        // Failed reads leave the previous value in place.
        assert!(matches!(input.read_string(&mut text), Err(Error::InvalidUtf8)));
        assert_eq!(text, "ok");

        let mut bytes = vec![9, 9];
        assert!(input.read_bytes(&mut bytes).unwrap_err().is_truncation());
        assert_eq!(bytes, [9, 9]);
    }

    #[test]
    fn test_failed_repeated_element_is_not_kept() {
        let mut input = Source::from_slice(&[0x0A, 0x01, b'a', 0x0A, 0x03, b'b']);
        let mut store = RepeatedString::new();
        let tag = input.read_tag().unwrap();
        assert!(input.read_repeated_strings(&mut store, tag).unwrap_err().is_truncation());
        assert_eq!(store.as_slice(), ["a".to_string()]);
    }

    #[test]
    fn test_failed_packed_span_appends_nothing() {
        let mut input = Source::from_slice(&[0x03, 0x02, 0x04, 0x80]);
        let mut store: Repeated<i64> = [7].into_iter().collect();
        assert!(input.read_packed::<SInt64>(&mut store).unwrap_err().is_truncation());
        assert_eq!(store.as_slice(), &[7]);
        assert_eq!(input.bytes_until_limit(), None);
    }

    #[test]
    fn test_wrap_resets_state() {
        let first = [0x08u8, 0x01];
        let second = [0x10u8, 0x02];
        let mut input = Source::from_slice(&first);
        input.push_limit(1).unwrap();
        input.read_tag().unwrap();

        let old = input.wrap(SliceBackend::new(&second));
        assert_eq!(old.position(), 1);
        assert_eq!(input.bytes_until_limit(), None);
        assert_eq!(input.read_tag().unwrap(), 0x10);
        assert_eq!(input.read_uint32().unwrap(), 2);
    }

    #[test]
    fn test_stream_and_buf_sources() {
        let data = [0x08u8, 0x96, 0x01];
        let mut input = Source::from_reader(&data[..]);
        assert_eq!(input.read_tag().unwrap(), 0x08);
        assert_eq!(input.read_int32().unwrap(), 150);
        assert_eq!(input.read_tag().unwrap(), 0);

        let mut input = Source::from_buf(bytes::Bytes::from_static(&[0x08, 0x96, 0x01]));
        assert_eq!(input.read_tag().unwrap(), 0x08);
        assert_eq!(input.read::<UInt32>().unwrap(), 150);
    }
}
