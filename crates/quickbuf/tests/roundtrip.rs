// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::unreadable_literal)] // Wire constants
#![allow(clippy::float_cmp)] // Exact round-trip assertions

//! Encode/decode round trips across every field kind.

mod common;

use common::{full_record, Flags, Point, Record, Status};
use quickbuf::{Error, ProtoMessage, Sink, SliceSink, Source};

#[test]
fn test_full_record_roundtrip() {
    let record = full_record();
    let bytes = record.to_bytes().unwrap();
    assert_eq!(bytes.len(), record.serialized_size());

    let decoded = Record::parse_from(&bytes).unwrap();
    assert_eq!(decoded, record);
    assert_eq!(decoded.count(), -42);
    assert_eq!(decoded.offset(), i64::MIN);
    assert_eq!(decoded.score(), -1.5e300);
    assert_eq!(decoded.name(), "sensor-7");
    assert_eq!(decoded.payload(), &[0, 1, 2, 0xFF]);
    assert_eq!(decoded.status(), Status::Retired);
    assert_eq!(decoded.origin(), Some(&Point::at(5, -5)));
    assert_eq!(decoded.samples().as_slice(), &[1, -1, 300, i32::MIN]);
    assert_eq!(decoded.tags().len(), 2);
    assert_eq!(&decoded.tags()[1], "");
    assert_eq!(decoded.path()[1], Point::at(-3, 4));
    assert_eq!(
        decoded.history().as_slice(),
        &[Status::Active, Status::Retired, Status::Unknown]
    );

    // Re-encoding a decoded message reproduces the exact bytes.
    assert_eq!(decoded.to_bytes().unwrap(), bytes);
}

#[test]
fn test_bool_and_negative_int32_bytes() {
    // -1 in its 5-byte form is still accepted.
    let short_form = [0x08, 0x01, 0x10, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
    let flags = Flags::parse_from(&short_form).unwrap();
    assert!(flags.enabled());
    assert_eq!(flags.level(), -1);

    // Encoders always sign-extend negative int32 to ten bytes.
    let bytes = flags.to_bytes().unwrap();
    assert_eq!(
        bytes,
        [0x08, 0x01, 0x10, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
    );
    assert_eq!(Flags::parse_from(&bytes).unwrap(), flags);
}

#[test]
fn test_known_encodings() {
    let mut point = Point::new();
    point.set_x(-1).set_y(150);
    assert_eq!(point.to_bytes().unwrap(), [0x08, 0x01, 0x10, 0xAC, 0x02]);

    let mut record = Record::new();
    record.set_name("hi");
    assert_eq!(record.to_bytes().unwrap(), [0x72, 0x02, b'h', b'i']);

    let mut record = Record::new();
    record.samples_mut().extend([3, 270, 86_942]);
    assert_eq!(
        record.to_bytes().unwrap(),
        [0x92, 0x01, 0x06, 0x03, 0x8E, 0x02, 0x9E, 0xA7, 0x05]
    );
}

#[test]
fn test_absent_fields_read_defaults() {
    let record = Record::new();
    assert!(record.is_empty());
    assert_eq!(record.count(), 0);
    assert_eq!(record.name(), "unnamed");
    assert_eq!(record.status(), Status::Active);
    assert_eq!(record.bias(), -7);
    assert_eq!(record.origin(), None);
    assert!(!record.has_name());
    assert_eq!(record.to_bytes().unwrap(), Vec::<u8>::new());

    // An explicitly set default value is still present on the wire.
    let mut record = Record::new();
    record.set_bias(-7);
    assert!(record.has_bias());
    assert_eq!(record.to_bytes().unwrap(), [0xC0, 0x01, 0x0D]);
}

#[test]
fn test_random_roundtrips() {
    let mut rng = fastrand::Rng::with_seed(0x5EED);
    for _ in 0..200 {
        let mut record = Record::new();
        if rng.bool() {
            record.set_count(rng.i32(..));
        }
        if rng.bool() {
            record.set_mask(rng.u64(..));
        }
        if rng.bool() {
            record.set_offset(rng.i64(..));
        }
        if rng.bool() {
            record.set_ratio(f32::from_bits(rng.u32(..) & 0x7F7F_FFFF));
        }
        if rng.bool() {
            let text: String = (0..rng.usize(..40)).map(|_| rng.alphanumeric()).collect();
            record.set_name(&text);
        }
        for _ in 0..rng.usize(..20) {
            record.samples_mut().push(rng.i32(..));
        }
        for _ in 0..rng.usize(..5) {
            record.path_mut().push(&Point::at(rng.i32(..), rng.i32(..)));
        }
        let bytes = record.to_bytes().unwrap();
        assert_eq!(bytes.len(), record.compute_serialized_size());
        let decoded = Record::parse_from(&bytes).unwrap();
        assert_eq!(decoded, record);
    }
}

#[test]
fn test_merge_from_bytes_overwrites_and_appends() {
    let mut first = Record::new();
    first.set_count(1).set_name("first");
    first.samples_mut().push(1);
    let mut second = Record::new();
    second.set_count(2);
    second.samples_mut().push(2);

    let mut bytes = first.to_bytes().unwrap();
    second.write_to_vec(&mut bytes).unwrap();

    let merged = Record::parse_from(&bytes).unwrap();
    assert_eq!(merged.count(), 2);
    assert_eq!(merged.name(), "first");
    assert_eq!(merged.samples().as_slice(), &[1, 2]);
}

#[test]
fn test_nested_message_merges_across_occurrences() {
    let mut a = Record::new();
    a.origin_mut().set_x(1);
    let mut b = Record::new();
    b.origin_mut().set_y(2);

    let mut bytes = a.to_bytes().unwrap();
    b.write_to_vec(&mut bytes).unwrap();
    let merged = Record::parse_from(&bytes).unwrap();
    assert_eq!(merged.origin(), Some(&Point::at(1, 2)));
}

#[test]
fn test_write_to_slice_and_out_of_space() {
    let record = full_record();
    let size = record.compute_serialized_size();

    let mut exact = vec![0u8; size];
    assert_eq!(record.write_to_slice(&mut exact).unwrap(), size);
    assert_eq!(exact, record.to_bytes().unwrap());

    let mut short = vec![0u8; size - 1];
    let err = record.write_to_slice(&mut short).unwrap_err();
    assert!(matches!(err, Error::OutOfSpace { .. }));
}

#[test]
fn test_engine_reuse_across_messages() {
    let a = Point::at(1, 1).to_bytes().unwrap();
    let b = Point::at(2, -2).to_bytes().unwrap();

    let mut input = Source::from_slice(&a);
    let mut point = Point::new();
    point.merge_from(&mut input).unwrap();
    assert_eq!(point, Point::at(1, 1));

    input.wrap(quickbuf::SliceBackend::new(&b));
    point.clear();
    point.merge_from(&mut input).unwrap();
    assert_eq!(point, Point::at(2, -2));

    let mut first = [0u8; 8];
    let mut second = [0u8; 8];
    let mut output = Sink::new(SliceSink::new(&mut first));
    Point::at(1, 1).write_to(&mut output).unwrap();
    let previous = output.wrap(SliceSink::new(&mut second));
    assert_eq!(previous.written(), a.as_slice());
    Point::at(2, -2).write_to(&mut output).unwrap();
    assert_eq!(output.position(), b.len());
}

#[test]
fn test_descriptor_contract() {
    let descriptor = Record::descriptor();
    assert_eq!(descriptor.name, "test.Record");
    assert_eq!(descriptor.fields.len(), 24);
    assert!(descriptor.retains_unknown_fields);
    assert!(descriptor.validate().is_ok());

    let samples = descriptor.field(18).unwrap();
    assert!(samples.packed && samples.is_repeated());
    assert_eq!(descriptor.field_by_name("bias").map(|f| f.number), Some(24));
    assert_eq!(descriptor.field_index(17), Some(16));
    assert!(matches!(
        descriptor.field(16).unwrap().default,
        quickbuf::DefaultValue::Enum(1)
    ));
    assert!(!Point::descriptor().retains_unknown_fields);
}
