// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Varint length-delimited framing for stream transports.
//!
//! Each frame is the message's byte length as a varint followed by the
//! message itself.

use std::io::{BufRead, Write};

use crate::config::{SourceConfig, MAX_VARINT64_BYTES};
use crate::error::{from_read_error, Error, Result};
use crate::message::ProtoMessage;
use crate::sink::Sink;
use crate::source::{Source, StreamBackend};

/// Writes the length prefix and the message, then flushes `writer`.
pub fn write_delimited<M: ProtoMessage, W: Write>(message: &M, writer: W) -> Result<()> {
    let size = message.compute_serialized_size();
    let mut output = Sink::from_writer(writer);
    output.write_raw_varint64(size as u64)?;
    message.write_to(&mut output)?;
    output.flush()
}

/// Reads a varint directly from `reader`.
///
/// Returns `Ok(None)` if the stream ends before the first byte.
pub fn read_raw_varint32_from<R: BufRead>(reader: &mut R) -> Result<Option<u32>> {
    let mut value = 0u32;
    for i in 0..MAX_VARINT64_BYTES {
        let byte = match reader.fill_buf().map_err(from_read_error)?.first() {
            Some(byte) => *byte,
            None if i == 0 => return Ok(None),
            None => return Err(Error::TruncatedInput),
        };
        reader.consume(1);
        if i < 5 {
            value |= u32::from(byte & 0x7F) << (7 * i);
        }
        if byte < 0x80 {
            return Ok(Some(value));
        }
    }
    Err(Error::MalformedVarint)
}

/// Merges one frame into `message`. `Ok(false)` at a clean end of stream.
pub fn read_delimited<M: ProtoMessage, R: BufRead>(message: &mut M, reader: R) -> Result<bool> {
    let mut input = Source::from_reader(reader);
    read_frame(&mut input, message)
}

fn read_frame<M: ProtoMessage, R: BufRead>(
    input: &mut Source<StreamBackend<R>>,
    message: &mut M,
) -> Result<bool> {
    if input.is_at_end()? {
        return Ok(false);
    }
    let length = input.read_length()?;
    let old_limit = input.push_limit(length)?;
    message.merge_from(input)?;
    input.check_last_tag_was(0)?;
    input.check_limit_reached()?;
    input.pop_limit(old_limit);
    Ok(true)
}

/// Reads consecutive frames from one stream, reusing one message instance.
#[derive(Debug)]
pub struct DelimitedReader<R> {
    input: Source<StreamBackend<R>>,
    frames: usize,
}

impl<R: BufRead> DelimitedReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, SourceConfig::default())
    }

    pub fn with_config(reader: R, config: SourceConfig) -> Self {
        Self {
            input: Source::with_config(StreamBackend::new(reader), config),
            frames: 0,
        }
    }

    /// Clears `message` (keeping its allocations) and reads the next frame
    /// into it. `Ok(false)` once the stream is exhausted.
    pub fn read_next<M: ProtoMessage>(&mut self, message: &mut M) -> Result<bool> {
        message.clear_quick();
        self.input.reset();
        let more = read_frame(&mut self.input, message)?;
        if more {
            self.frames += 1;
        }
        Ok(more)
    }

    pub fn frames_read(&self) -> usize {
        self.frames
    }

    pub fn into_inner(self) -> R {
        self.input.into_inner().into_inner()
    }
}
