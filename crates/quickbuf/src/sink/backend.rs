// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte sinks the encode engine writes to.
//!
//! - [`SliceSink`]: fixed-capacity borrowed buffer
//! - `Vec<u8>`: growable buffer
//! - [`StreamSink`]: any [`Write`]
//! - [`BufMutSink`]: any [`bytes::BufMut`]

use std::io::Write;

use bytes::BufMut;

use crate::error::{Error, Result};

/// Low-level byte sink.
pub trait WriteBackend {
    /// Bytes written since the sink was created (or wrapped).
    fn position(&self) -> usize;

    fn write_byte(&mut self, byte: u8) -> Result<()>;

    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: WriteBackend + ?Sized> WriteBackend for &mut T {
    fn position(&self) -> usize {
        (**self).position()
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_byte(byte)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl WriteBackend for Vec<u8> {
    #[inline]
    fn position(&self) -> usize {
        self.len()
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.push(byte);
        Ok(())
    }

    #[inline]
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }
}

// =======================================================================
// Fixed-capacity
// =======================================================================

/// Write cursor over a borrowed mutable slice; never grows.
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// The written prefix of the buffer.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.offset]
    }

    #[inline]
    fn out_of_space(&self, needed: usize) -> Error {
        log::debug!(
            "[Sink] out of space: need {} bytes, {} available",
            needed,
            self.remaining()
        );
        Error::OutOfSpace {
            needed,
            available: self.remaining(),
        }
    }
}

impl WriteBackend for SliceSink<'_> {
    #[inline]
    fn position(&self) -> usize {
        self.offset
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        let slot = self
            .buf
            .get_mut(self.offset)
            .ok_or(Error::OutOfSpace { needed: 1, available: 0 })?;
        *slot = byte;
        self.offset += 1;
        Ok(())
    }

    #[inline]
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.remaining() {
            return Err(self.out_of_space(data.len()));
        }
        self.buf[self.offset..self.offset + data.len()].copy_from_slice(data);
        self.offset += data.len();
        Ok(())
    }
}

// =======================================================================
// Stream
// =======================================================================

/// Sink over a blocking writer. Wrap unbuffered writers in a `BufWriter`.
#[derive(Debug)]
pub struct StreamSink<W> {
    inner: W,
    written: usize,
}

impl<W: Write> StreamSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> WriteBackend for StreamSink<W> {
    fn position(&self) -> usize {
        self.written
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_all(&[byte])
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        self.written += data.len();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

// =======================================================================
// bytes::BufMut
// =======================================================================

/// Sink over a [`bytes::BufMut`]; fixed-capacity buffers report `OutOfSpace`.
#[derive(Debug)]
pub struct BufMutSink<B> {
    buf: B,
    written: usize,
}

impl<B: BufMut> BufMutSink<B> {
    pub fn new(buf: B) -> Self {
        Self { buf, written: 0 }
    }

    pub fn get_ref(&self) -> &B {
        &self.buf
    }

    pub fn into_inner(self) -> B {
        self.buf
    }
}

impl<B: BufMut> WriteBackend for BufMutSink<B> {
    fn position(&self) -> usize {
        self.written
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_all(&[byte])
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let available = self.buf.remaining_mut();
        if data.len() > available {
            log::debug!("[Sink] buffer full: need {} bytes, {} available", data.len(), available);
            return Err(Error::OutOfSpace {
                needed: data.len(),
                available,
            });
        }
        self.buf.put_slice(data);
        self.written += data.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_sink_out_of_space() {
        let mut buf = [0u8; 3];
        let mut sink = SliceSink::new(&mut buf);
        sink.write_all(&[1, 2]).unwrap();
        let err = sink.write_all(&[3, 4]).unwrap_err();
        assert!(matches!(err, Error::OutOfSpace { needed: 2, available: 1 }));
        sink.write_byte(3).unwrap();
        assert!(sink.write_byte(4).is_err());
        assert_eq!(sink.written(), &[1, 2, 3]);
    }

    #[test]
    fn test_vec_and_stream_sinks() {
        let mut vec = Vec::<u8>::new();
        WriteBackend::write_all(&mut vec, &[1, 2]).unwrap();
        WriteBackend::write_byte(&mut vec, 3).unwrap();
        assert_eq!(WriteBackend::position(&vec), 3);

        let mut stream = StreamSink::new(Vec::new());
        stream.write_all(&[9, 8]).unwrap();
        stream.flush().unwrap();
        assert_eq!(stream.position(), 2);
        assert_eq!(stream.into_inner(), [9, 8]);
    }

    #[test]
    fn test_buf_mut_sink() {
        let mut sink = BufMutSink::new(bytes::BytesMut::new());
        sink.write_all(b"abc").unwrap();
        assert_eq!(&sink.get_ref()[..], b"abc");

        let mut fixed = [0u8; 2];
        let mut sink = BufMutSink::new(&mut fixed[..]);
        assert!(matches!(sink.write_all(b"abc"), Err(Error::OutOfSpace { .. })));
    }
}
