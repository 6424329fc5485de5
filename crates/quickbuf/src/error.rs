// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec error type.
//!
//! Every failure is unrecoverable for the current parse or write call and is
//! propagated immediately. A message mutated by a merge that then fails keeps
//! whatever fields were merged before the failure.

use thiserror::Error;

/// Errors raised by the decode and encode engines.
#[derive(Debug, Error)]
pub enum Error {
    /// Fewer bytes are available than a field's declared or implied length requires.
    #[error("truncated input: a field extends past the end of the input or the current limit")]
    TruncatedInput,

    /// A varint ran past its maximum byte count without terminating.
    #[error("malformed varint: no terminating byte within 10 bytes")]
    MalformedVarint,

    /// Field number zero or an unrecognized wire type.
    #[error("invalid tag {tag:#x}")]
    InvalidTag { tag: u32 },

    /// A group's closing tag does not match its opening field number.
    #[error("end-group tag did not match the expected tag")]
    InvalidEndTag,

    /// A length prefix decoded to a negative count.
    #[error("negative length prefix")]
    NegativeSize,

    /// Message or group nesting exceeded the configured recursion limit.
    #[error("protocol message had too many levels of nesting (recursion limit {limit})")]
    RecursionLimitExceeded { limit: u32 },

    /// Encode attempted on a message lacking a required field.
    #[error("message {message} is missing required field {field}")]
    MissingRequiredField {
        message: &'static str,
        field: &'static str,
    },

    /// A `string` field payload is not valid UTF-8.
    #[error("string field contains invalid UTF-8")]
    InvalidUtf8,

    /// A fixed-capacity output cannot hold the write.
    #[error("output out of space: needed {needed} bytes, {available} available")]
    OutOfSpace { needed: usize, available: usize },

    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by input ending early (including a short stream).
    pub fn is_truncation(&self) -> bool {
        matches!(self, Error::TruncatedInput)
    }
}

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Maps a stream read failure, folding EOF into [`Error::TruncatedInput`].
pub(crate) fn from_read_error(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::TruncatedInput
    } else {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_maps_to_truncation() {
        let err = from_read_error(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
        assert!(err.is_truncation());

        let err = from_read_error(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_truncation());
    }

    #[test]
    fn test_display_mentions_limit() {
        let msg = Error::RecursionLimitExceeded { limit: 64 }.to_string();
        assert!(msg.contains("limit"));
        assert!(msg.contains("64"));

        let msg = Error::MissingRequiredField {
            message: "TestRequired",
            field: "a",
        }
        .to_string();
        assert!(msg.contains("TestRequired"));
    }
}
