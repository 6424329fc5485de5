// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! quickbuf - allocation-averse Protocol Buffers runtime
//!
//! Messages are plain structs annotated with [`macro@message`]; the macro
//! emits specialized merge, size and write code against this runtime.
//!
//! # Modules
//!
//! - [`wire`] - Tag layout, zigzag and varint sizes
//! - [`source`] - Decode engine and its byte backends
//! - [`sink`] - Encode engine and its byte backends
//! - [`repeated`] - Repeated field containers
//! - [`descriptor`] - Static field-list contract of a message
//! - [`framing`] - Length-delimited stream framing
//! - [`config`] - Constants and decoder configuration
//!
//! # Example
//!
//! ```
//! use quickbuf::{message, ProtoEnum, ProtoMessage, Repeated};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, ProtoEnum)]
//! pub enum Unit {
//!     Celsius = 1,
//!     Kelvin = 2,
//! }
//!
//! #[message]
//! pub struct Reading {
//!     #[field(1, string)]
//!     sensor: String,
//!     #[field(2, enumeration, default = Unit::Kelvin)]
//!     unit: Unit,
//!     #[field(3, sint32, repeated, packed)]
//!     samples: Repeated<i32>,
//! }
//!
//! let mut reading = Reading::new();
//! reading.set_sensor("t0").set_unit(Unit::Celsius);
//! reading.samples_mut().extend([-3, 0, 4]);
//!
//! let bytes = reading.to_bytes().unwrap();
//! let decoded = Reading::parse_from(&bytes).unwrap();
//! assert_eq!(decoded, reading);
//! assert_eq!(decoded.unit(), Unit::Celsius);
//! assert_eq!(Reading::new().unit(), Unit::Kelvin);
//! ```

extern crate self as quickbuf;

pub mod config;
pub mod descriptor;
pub mod framing;
pub mod kind;
pub mod repeated;
pub mod sink;
pub mod size;
pub mod source;
pub mod wire;

mod bits;
mod error;
mod lazy;
mod message;

pub use bits::BitSet;
pub use config::SourceConfig;
pub use descriptor::{Cardinality, DefaultValue, DescriptorError, FieldDescriptor, FieldType, MessageDescriptor};
pub use error::{Error, Result};
pub use kind::{ProtoEnum, ScalarKind, ScalarValue};
pub use lazy::Lazy;
pub use message::{CachedSize, MessageState, ProtoMessage};
pub use repeated::{Repeated, RepeatedBytes, RepeatedField, RepeatedMessage, RepeatedObjects, RepeatedString, Reusable};
pub use sink::{BufMutSink, Sink, SliceSink, StreamSink, WriteBackend};
pub use source::{BufBackend, ReadBackend, SliceBackend, Source, StreamBackend};
pub use wire::WireType;

/// Message codegen: `#[quickbuf::message]` and `#[derive(quickbuf::ProtoEnum)]`.
pub use quickbuf_codegen::{message, ProtoEnum};
