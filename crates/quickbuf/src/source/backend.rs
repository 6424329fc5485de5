// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte sources the decode engine reads from.
//!
//! - [`SliceBackend`]: borrowed contiguous memory, supports look-ahead
//! - [`StreamBackend`]: any blocking [`BufRead`]
//! - [`BufBackend`]: any [`bytes::Buf`] (possibly non-contiguous)

use std::io::BufRead;

use bytes::{Buf, BufMut};

use crate::error::{from_read_error, Error, Result};

/// Low-level byte source.
///
/// Reads either complete or fail with [`Error::TruncatedInput`]; limits are
/// enforced by the engine above.
pub trait ReadBackend {
    /// Bytes consumed since the backend was created.
    fn position(&self) -> usize;

    /// False once the underlying data is exhausted (may block on streams).
    fn has_remaining(&mut self) -> Result<bool>;

    fn read_byte(&mut self) -> Result<u8>;

    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()>;

    fn skip(&mut self, count: usize) -> Result<()>;

    /// Appends exactly `count` bytes to `dst`; on failure `dst` is left as it was.
    fn append_to(&mut self, count: usize, dst: &mut Vec<u8>) -> Result<()>;

    /// Unconsumed contiguous bytes, for backends with random access.
    fn lookahead(&self) -> Option<&[u8]> {
        None
    }
}

impl<T: ReadBackend + ?Sized> ReadBackend for &mut T {
    fn position(&self) -> usize {
        (**self).position()
    }

    fn has_remaining(&mut self) -> Result<bool> {
        (**self).has_remaining()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        (**self).read_exact(dst)
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        (**self).skip(count)
    }

    fn append_to(&mut self, count: usize, dst: &mut Vec<u8>) -> Result<()> {
        (**self).append_to(count, dst)
    }

    fn lookahead(&self) -> Option<&[u8]> {
        (**self).lookahead()
    }
}

// =======================================================================
// Array-backed
// =======================================================================

/// Read cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct SliceBackend<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> SliceBackend<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    #[inline]
    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(Error::TruncatedInput);
        }
        let data: &'a [u8] = self.data;
        let chunk = &data[self.offset..self.offset + count];
        self.offset += count;
        Ok(chunk)
    }
}

impl ReadBackend for SliceBackend<'_> {
    #[inline]
    fn position(&self) -> usize {
        self.offset
    }

    #[inline]
    fn has_remaining(&mut self) -> Result<bool> {
        Ok(self.offset < self.data.len())
    }

    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.offset).ok_or(Error::TruncatedInput)?;
        self.offset += 1;
        Ok(byte)
    }

    #[inline]
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        let chunk = self.take(dst.len())?;
        dst.copy_from_slice(chunk);
        Ok(())
    }

    #[inline]
    fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    fn append_to(&mut self, count: usize, dst: &mut Vec<u8>) -> Result<()> {
        let chunk = self.take(count)?;
        dst.extend_from_slice(chunk);
        Ok(())
    }

    #[inline]
    fn lookahead(&self) -> Option<&[u8]> {
        Some(&self.data[self.offset..])
    }
}

// =======================================================================
// Stream-backed
// =======================================================================

/// Blocking reader; bytes are pulled through the reader's own buffer.
#[derive(Debug)]
pub struct StreamBackend<R> {
    inner: R,
    consumed: usize,
}

impl<R: BufRead> StreamBackend<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Feeds at most `count` bytes to `sink`, chunk by chunk.
    fn drain(&mut self, mut count: usize, mut sink: impl FnMut(&[u8])) -> Result<()> {
        while count > 0 {
            let available = self.inner.fill_buf().map_err(from_read_error)?;
            if available.is_empty() {
                return Err(Error::TruncatedInput);
            }
            let n = available.len().min(count);
            sink(&available[..n]);
            self.inner.consume(n);
            self.consumed += n;
            count -= n;
        }
        Ok(())
    }
}

impl<R: BufRead> ReadBackend for StreamBackend<R> {
    fn position(&self) -> usize {
        self.consumed
    }

    fn has_remaining(&mut self) -> Result<bool> {
        Ok(!self.inner.fill_buf().map_err(from_read_error)?.is_empty())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self
            .inner
            .fill_buf()
            .map_err(from_read_error)?
            .first()
            .ok_or(Error::TruncatedInput)?;
        self.inner.consume(1);
        self.consumed += 1;
        Ok(byte)
    }

    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        self.drain(dst.len(), |chunk| {
            dst[filled..filled + chunk.len()].copy_from_slice(chunk);
            filled += chunk.len();
        })
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        self.drain(count, |_| {})
    }

    fn append_to(&mut self, count: usize, dst: &mut Vec<u8>) -> Result<()> {
        let start = dst.len();
        let result = self.drain(count, |chunk| dst.extend_from_slice(chunk));
        if result.is_err() {
            dst.truncate(start);
        }
        result
    }
}

// =======================================================================
// bytes::Buf-backed
// =======================================================================

/// Source over any [`bytes::Buf`], e.g. `Bytes` or a chain of chunks.
#[derive(Debug)]
pub struct BufBackend<B> {
    buf: B,
    consumed: usize,
}

impl<B: Buf> BufBackend<B> {
    pub fn new(buf: B) -> Self {
        Self { buf, consumed: 0 }
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    #[inline]
    fn ensure(&self, count: usize) -> Result<()> {
        if self.buf.remaining() < count {
            return Err(Error::TruncatedInput);
        }
        Ok(())
    }
}

impl<B: Buf> ReadBackend for BufBackend<B> {
    fn position(&self) -> usize {
        self.consumed
    }

    fn has_remaining(&mut self) -> Result<bool> {
        Ok(self.buf.has_remaining())
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.ensure(1)?;
        self.consumed += 1;
        Ok(self.buf.get_u8())
    }

    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        self.ensure(dst.len())?;
        self.buf.copy_to_slice(dst);
        self.consumed += dst.len();
        Ok(())
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.buf.advance(count);
        self.consumed += count;
        Ok(())
    }

    fn append_to(&mut self, count: usize, dst: &mut Vec<u8>) -> Result<()> {
        self.ensure(count)?;
        dst.put((&mut self.buf).take(count));
        self.consumed += count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn exercise(backend: &mut dyn ReadBackend) {
        assert!(backend.has_remaining().unwrap());
        assert_eq!(backend.read_byte().unwrap(), 1);

        let mut pair = [0u8; 2];
        backend.read_exact(&mut pair).unwrap();
        assert_eq!(pair, [2, 3]);

        backend.skip(1).unwrap();
        let mut out = vec![0xAA];
        backend.append_to(2, &mut out).unwrap();
        assert_eq!(out, [0xAA, 5, 6]);
        assert_eq!(backend.position(), 6);

        assert!(backend.append_to(5, &mut out).unwrap_err().is_truncation());
        assert_eq!(out, [0xAA, 5, 6]);
    }

    const DATA: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    #[test]
    fn test_slice_backend() {
        let mut backend = SliceBackend::new(&DATA);
        exercise(&mut backend);
        assert_eq!(backend.lookahead(), Some(&DATA[6..]));
    }

    #[test]
    fn test_stream_backend_small_buffer() {
        // capacity 3 forces reads to span several fill_buf calls
        let mut backend = StreamBackend::new(BufReader::with_capacity(3, &DATA[..]));
        assert!(backend.lookahead().is_none());
        exercise(&mut backend);
    }

    #[test]
    fn test_buf_backend_chained() {
        let chained = Buf::chain(&DATA[..3], &DATA[3..]);
        let mut backend = BufBackend::new(chained);
        exercise(&mut backend);
    }

    #[test]
    fn test_empty_sources() {
        let mut slice = SliceBackend::new(&[]);
        assert!(!slice.has_remaining().unwrap());
        assert!(slice.read_byte().unwrap_err().is_truncation());

        let mut stream = StreamBackend::new(&[0u8; 0][..]);
        assert!(!stream.has_remaining().unwrap());
        assert!(stream.read_byte().unwrap_err().is_truncation());
    }
}
