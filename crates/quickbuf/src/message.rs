// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message model.
//!
//! [`ProtoMessage`] is implemented by `#[quickbuf::message]` structs. The
//! generated code keeps its bookkeeping in a [`MessageState`]: presence
//! bits, the cached serialized size and retained unknown bytes.

use core::cell::Cell;
use core::fmt;
use std::io::{BufRead, Write};

use crate::bits::BitSet;
use crate::descriptor::MessageDescriptor;
use crate::error::Result;
use crate::framing;
use crate::repeated::Reusable;
use crate::sink::{Sink, SliceSink, WriteBackend};
use crate::source::{ReadBackend, Source};

// =======================================================================
// Cached size
// =======================================================================

/// Serialized size remembered between a size computation and the next mutation.
pub struct CachedSize(Cell<i32>);

impl CachedSize {
    const INVALID: i32 = -1;

    pub const fn new() -> Self {
        Self(Cell::new(Self::INVALID))
    }

    #[inline]
    pub fn get(&self) -> Option<usize> {
        usize::try_from(self.0.get()).ok()
    }

    /// Sizes that do not fit the wire's 2 GiB bound are never cached.
    #[inline]
    pub fn set(&self, size: usize) {
        self.0.set(i32::try_from(size).unwrap_or(Self::INVALID));
    }

    #[inline]
    pub fn invalidate(&self) {
        self.0.set(Self::INVALID);
    }
}

impl Default for CachedSize {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CachedSize {
    fn clone(&self) -> Self {
        Self(Cell::new(self.0.get()))
    }
}

impl fmt::Debug for CachedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(size) => write!(f, "CachedSize({size})"),
            None => f.write_str("CachedSize(invalid)"),
        }
    }
}

// =======================================================================
// Per-message bookkeeping
// =======================================================================

/// Presence bits, cached size and unknown bytes of one message.
#[derive(Clone, Default)]
pub struct MessageState<const W: usize> {
    bits: BitSet<W>,
    cached_size: CachedSize,
    unknown: Vec<u8>,
}

impl<const W: usize> MessageState<W> {
    pub const fn new() -> Self {
        Self {
            bits: BitSet::new(),
            cached_size: CachedSize::new(),
            unknown: Vec::new(),
        }
    }

    #[inline]
    pub fn bits(&self) -> &BitSet<W> {
        &self.bits
    }

    #[inline]
    pub fn has(&self, index: usize) -> bool {
        self.bits.is_set(index)
    }

    /// Marks field `index` present; invalidates the cached size.
    #[inline]
    pub fn set(&mut self, index: usize) {
        self.bits.set(index);
        self.cached_size.invalidate();
    }

    #[inline]
    pub fn unset(&mut self, index: usize) {
        self.bits.unset(index);
        self.cached_size.invalidate();
    }

    #[inline]
    pub fn cached_size(&self) -> &CachedSize {
        &self.cached_size
    }

    #[inline]
    pub fn invalidate_size(&self) {
        self.cached_size.invalidate();
    }

    #[inline]
    pub fn unknown_bytes(&self) -> &[u8] {
        &self.unknown
    }

    /// Unknown-field buffer; writing to it invalidates the cached size.
    #[inline]
    pub fn unknown_mut(&mut self) -> &mut Vec<u8> {
        self.cached_size.invalidate();
        &mut self.unknown
    }

    /// No field present and no unknown bytes.
    #[inline]
    pub fn is_clear(&self) -> bool {
        self.bits.is_empty() && self.unknown.is_empty()
    }

    /// Clears bits and unknown bytes (keeping the buffer) and the cached size.
    pub fn reset(&mut self) {
        self.bits.clear();
        self.cached_size.invalidate();
        self.unknown.clear();
    }

    pub fn copy_from(&mut self, other: &Self) {
        self.bits = other.bits;
        self.cached_size = other.cached_size.clone();
        self.unknown.clear();
        self.unknown.extend_from_slice(&other.unknown);
    }
}

impl<const W: usize> fmt::Debug for MessageState<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageState")
            .field("bits", &self.bits)
            .field("cached_size", &self.cached_size)
            .field("unknown_len", &self.unknown.len())
            .finish()
    }
}

// =======================================================================
// Message trait
// =======================================================================

/// A schema-generated protobuf message.
///
/// `Reusable::reset` is [`ProtoMessage::clear_quick`] and
/// `Reusable::copy_from` deep-copies every field together with the
/// presence bits and cached size.
pub trait ProtoMessage: Reusable + Clone + PartialEq + fmt::Debug {
    /// Static field list of this message type.
    fn descriptor() -> &'static MessageDescriptor;

    /// Merges fields from `input` until tag 0 or an end-group tag.
    fn merge_from<B: ReadBackend>(&mut self, input: &mut Source<B>) -> Result<()>;

    /// Writes every present field. Sub-message lengths come from their
    /// cached sizes, so call [`ProtoMessage::compute_serialized_size`] first.
    fn write_to<B: WriteBackend>(&self, output: &mut Sink<B>) -> Result<()>;

    /// Recomputes the size of this message and its sub-messages, caching all of them.
    fn compute_serialized_size(&self) -> usize;

    fn cached_size(&self) -> &CachedSize;

    /// Full reset: scalars back to defaults, containers emptied (keeping
    /// their storage), sub-messages cleared, unknown bytes dropped.
    fn clear(&mut self);

    /// Resets presence, cached size, unknown bytes and container lengths
    /// only. Scalar storage keeps stale values that no getter can observe.
    fn clear_quick(&mut self);

    /// Present scalars overwrite, present sub-messages merge recursively,
    /// repeated fields and unknown bytes append.
    fn merge_from_message(&mut self, other: &Self);

    /// All required fields present, recursively through sub-messages.
    fn is_initialized(&self) -> bool;

    /// No field present and no unknown bytes retained.
    fn is_empty(&self) -> bool;

    fn unknown_bytes(&self) -> &[u8];

    // -------------------------------------------------------------------
    // Provided entry points
    // -------------------------------------------------------------------

    /// Cached size if valid, otherwise a fresh computation.
    fn serialized_size(&self) -> usize {
        match self.cached_size().get() {
            Some(size) => size,
            None => self.compute_serialized_size(),
        }
    }

    fn parse_from(data: &[u8]) -> Result<Self> {
        let mut message = Self::default();
        message.merge_from_bytes(data)?;
        Ok(message)
    }

    /// Merges one complete serialized message.
    fn merge_from_bytes(&mut self, data: &[u8]) -> Result<()> {
        let mut input = Source::from_slice(data);
        self.merge_from(&mut input)?;
        input.check_last_tag_was(0)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.compute_serialized_size());
        self.write_to(&mut Sink::new(&mut out))?;
        Ok(out)
    }

    /// Appends the serialized message to `out`.
    fn write_to_vec(&self, out: &mut Vec<u8>) -> Result<()> {
        out.reserve(self.compute_serialized_size());
        self.write_to(&mut Sink::new(out))
    }

    /// Serializes into a fixed buffer, returning the bytes written.
    fn write_to_slice(&self, buf: &mut [u8]) -> Result<usize> {
        self.compute_serialized_size();
        let mut output = Sink::new(SliceSink::new(buf));
        self.write_to(&mut output)?;
        Ok(output.position())
    }

    /// Writes a varint length prefix followed by the message.
    fn write_delimited_to<W: Write>(&self, writer: W) -> Result<()> {
        framing::write_delimited(self, writer)
    }

    /// Merges one length-prefixed message; `Ok(false)` at a clean end of stream.
    fn merge_delimited_from<R: BufRead>(&mut self, reader: R) -> Result<bool> {
        framing::read_delimited(self, reader)
    }
}
