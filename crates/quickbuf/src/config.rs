// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! quickbuf configuration - single source of truth
//!
//! Wire-format constants and the decode engine's runtime knobs.
//! **Never hardcode these elsewhere.**
//!
//! # Example
//!
//! ```
//! use quickbuf::{Source, SourceConfig};
//!
//! let config = SourceConfig::default()
//!     .with_recursion_limit(100)
//!     .with_discard_unknown_fields(true);
//! let source = Source::with_config(quickbuf::SliceBackend::new(&[]), config);
//! assert_eq!(source.config().recursion_limit, 100);
//! ```

// =======================================================================
// Wire format limits
// =======================================================================

/// Default maximum message/group nesting depth accepted by a decoder.
pub const DEFAULT_RECURSION_LIMIT: u32 = 64;

/// Longest canonical encoding of a 32-bit varint.
pub const MAX_VARINT32_BYTES: usize = 5;

/// Longest encoding of any varint. A signed 32-bit value is sign-extended
/// to 64 bits, so it can also take this many bytes.
pub const MAX_VARINT64_BYTES: usize = 10;

/// Size of a `fixed32`, `sfixed32` or `float` payload.
pub const FIXED32_SIZE: usize = 4;

/// Size of a `fixed64`, `sfixed64` or `double` payload.
pub const FIXED64_SIZE: usize = 8;

/// Largest legal field number (29 bits).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// First field number reserved for the protobuf implementation.
pub const RESERVED_FIELD_NUMBER_START: u32 = 19_000;

/// Last field number reserved for the protobuf implementation.
pub const RESERVED_FIELD_NUMBER_END: u32 = 19_999;

// =======================================================================
// Decoder configuration
// =======================================================================

/// Runtime knobs of a [`crate::Source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceConfig {
    /// Maximum nesting of messages and groups (including skipped unknown groups).
    pub recursion_limit: u32,
    /// Drop unknown fields even for messages that retain them.
    pub discard_unknown_fields: bool,
    /// Pre-size repeated containers by scanning ahead (array-backed input only).
    pub reserve_lookahead: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            discard_unknown_fields: false,
            reserve_lookahead: true,
        }
    }
}

impl SourceConfig {
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_discard_unknown_fields(mut self, discard: bool) -> Self {
        self.discard_unknown_fields = discard;
        self
    }

    pub fn with_reserve_lookahead(mut self, enabled: bool) -> Self {
        self.reserve_lookahead = enabled;
        self
    }
}

/// True if `number` may be declared in a schema.
pub const fn is_valid_field_number(number: u32) -> bool {
    number >= 1
        && number <= MAX_FIELD_NUMBER
        && !(number >= RESERVED_FIELD_NUMBER_START && number <= RESERVED_FIELD_NUMBER_END)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SourceConfig::default();
        assert_eq!(config.recursion_limit, 64);
        assert!(!config.discard_unknown_fields);
        assert!(config.reserve_lookahead);
    }

    #[test]
    fn test_builders() {
        let config = SourceConfig::default()
            .with_recursion_limit(3)
            .with_discard_unknown_fields(true)
            .with_reserve_lookahead(false);
        assert_eq!(config.recursion_limit, 3);
        assert!(config.discard_unknown_fields);
        assert!(!config.reserve_lookahead);
    }

    #[test]
    fn test_field_number_range() {
        assert!(!is_valid_field_number(0));
        assert!(is_valid_field_number(1));
        assert!(is_valid_field_number(18_999));
        assert!(!is_valid_field_number(19_000));
        assert!(!is_valid_field_number(19_999));
        assert!(is_valid_field_number(20_000));
        assert!(is_valid_field_number(MAX_FIELD_NUMBER));
        assert!(!is_valid_field_number(MAX_FIELD_NUMBER + 1));
    }
}
