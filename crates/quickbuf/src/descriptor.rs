// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static field-list contract of a message type.
//!
//! `#[quickbuf::message]` emits one `MessageDescriptor` per message. Field
//! index `i` in [`MessageDescriptor::fields`] owns presence bit `i`.

use thiserror::Error;

use crate::bits::BitSet;
use crate::config::{is_valid_field_number, MAX_FIELD_NUMBER};
use crate::wire::{make_tag, WireType};

/// Declared protobuf field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Double,
    Float,
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Bool,
    Enum,
    String,
    Bytes,
    Message,
    Group,
}

impl FieldType {
    /// Wire type of one (non-packed) value.
    pub const fn wire_type(self) -> WireType {
        match self {
            Self::Int32
            | Self::Int64
            | Self::UInt32
            | Self::UInt64
            | Self::SInt32
            | Self::SInt64
            | Self::Bool
            | Self::Enum => WireType::Varint,
            Self::Fixed64 | Self::SFixed64 | Self::Double => WireType::Fixed64,
            Self::Fixed32 | Self::SFixed32 | Self::Float => WireType::Fixed32,
            Self::String | Self::Bytes | Self::Message => WireType::LengthDelimited,
            Self::Group => WireType::StartGroup,
        }
    }

    /// Scalars and enums may use the packed encoding when repeated.
    pub const fn is_packable(self) -> bool {
        !matches!(
            self,
            Self::String | Self::Bytes | Self::Message | Self::Group
        )
    }

    pub const fn is_message(self) -> bool {
        matches!(self, Self::Message | Self::Group)
    }

    /// Name as written in a `.proto` file.
    pub const fn proto_name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::SInt32 => "sint32",
            Self::SInt64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::SFixed32 => "sfixed32",
            Self::SFixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::Enum => "enum",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Message => "message",
            Self::Group => "group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
}

/// Schema-declared default of a singular field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    /// The type's zero value (or first enum value).
    None,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(&'static str),
    Bytes(&'static [u8]),
    Enum(i32),
}

/// Layout of a single field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub number: u32,
    pub field_type: FieldType,
    pub cardinality: Cardinality,
    /// Written as one length-delimited span (repeated packable fields only).
    pub packed: bool,
    /// Index into [`MessageDescriptor::oneofs`].
    pub oneof_index: Option<u16>,
    pub default: DefaultValue,
}

impl FieldDescriptor {
    /// Tag of one non-packed value.
    pub const fn tag(&self) -> u32 {
        make_tag(self.number, self.field_type.wire_type())
    }

    /// Tag of the packed form (length-delimited).
    pub const fn packed_tag(&self) -> u32 {
        make_tag(self.number, WireType::LengthDelimited)
    }

    /// Tag the encoder emits for this field.
    pub const fn write_tag(&self) -> u32 {
        if self.packed {
            self.packed_tag()
        } else {
            self.tag()
        }
    }

    /// Tag closing a group field.
    pub const fn end_group_tag(&self) -> u32 {
        make_tag(self.number, WireType::EndGroup)
    }

    pub const fn is_repeated(&self) -> bool {
        matches!(self.cardinality, Cardinality::Repeated)
    }

    pub const fn is_required(&self) -> bool {
        matches!(self.cardinality, Cardinality::Required)
    }

    /// True if the decoder accepts both the packed and the non-packed form.
    pub const fn accepts_packed(&self) -> bool {
        self.is_repeated() && self.field_type.is_packable()
    }
}

/// Type descriptor: the ordered field list of one message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageDescriptor {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
    pub oneofs: &'static [&'static str],
    pub retains_unknown_fields: bool,
}

impl MessageDescriptor {
    pub fn field(&self, number: u32) -> Option<&'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().find(|f| f.number == number)
    }

    /// Presence index of the field with `number`.
    pub fn field_index(&self, number: u32) -> Option<usize> {
        self.fields.iter().position(|f| f.number == number)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    /// Members of oneof group `index`.
    pub fn oneof_fields(&self, index: u16) -> impl Iterator<Item = &'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().filter(move |f| f.oneof_index == Some(index))
    }

    /// Bits of all required fields.
    pub const fn required_mask<const W: usize>(&self) -> BitSet<W> {
        let mut words = [0u64; W];
        let mut i = 0;
        while i < self.fields.len() {
            if self.fields[i].is_required() {
                words[i / 64] |= 1u64 << (i % 64);
            }
            i += 1;
        }
        BitSet::from_words(words)
    }

    /// Bits of the members of oneof group `oneof`.
    pub const fn oneof_mask<const W: usize>(&self, oneof: u16) -> BitSet<W> {
        let mut words = [0u64; W];
        let mut i = 0;
        while i < self.fields.len() {
            if let Some(group) = self.fields[i].oneof_index {
                if group == oneof {
                    words[i / 64] |= 1u64 << (i % 64);
                }
            }
            i += 1;
        }
        BitSet::from_words(words)
    }

    /// Checks the field list for contract violations.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.number > MAX_FIELD_NUMBER || field.number == 0 {
                return Err(DescriptorError::NumberOutOfRange {
                    field: field.name,
                    number: field.number,
                });
            }
            if !is_valid_field_number(field.number) {
                return Err(DescriptorError::ReservedNumber {
                    field: field.name,
                    number: field.number,
                });
            }
            if self.fields[..i].iter().any(|f| f.number == field.number) {
                return Err(DescriptorError::DuplicateNumber {
                    field: field.name,
                    number: field.number,
                });
            }
            if field.packed && !field.accepts_packed() {
                return Err(DescriptorError::NotPackable { field: field.name });
            }
            if let Some(index) = field.oneof_index {
                if usize::from(index) >= self.oneofs.len() {
                    return Err(DescriptorError::UnknownOneof {
                        field: field.name,
                        index,
                    });
                }
                if !matches!(field.cardinality, Cardinality::Optional) {
                    return Err(DescriptorError::OneofCardinality { field: field.name });
                }
            }
        }
        Ok(())
    }
}

/// Field-list contract violations found by [`MessageDescriptor::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("field {field}: number {number} declared twice")]
    DuplicateNumber { field: &'static str, number: u32 },

    #[error("field {field}: number {number} outside 1..=536870911")]
    NumberOutOfRange { field: &'static str, number: u32 },

    #[error("field {field}: number {number} is in the reserved range 19000..=19999")]
    ReservedNumber { field: &'static str, number: u32 },

    #[error("field {field}: only repeated scalar and enum fields can be packed")]
    NotPackable { field: &'static str },

    #[error("field {field}: oneof index {index} is not declared")]
    UnknownOneof { field: &'static str, index: u16 },

    #[error("field {field}: oneof members must be optional")]
    OneofCardinality { field: &'static str },
}
