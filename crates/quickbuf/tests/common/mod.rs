// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared test schema.

#![allow(dead_code)]

use quickbuf::{message, Lazy, ProtoEnum, Repeated, RepeatedBytes, RepeatedMessage, RepeatedString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ProtoEnum)]
pub enum Status {
    Unknown = 0,
    Active = 1,
    Suspended = 2,
    Retired = -1,
}

#[message]
pub struct Point {
    #[field(1, sint32)]
    x: i32,
    #[field(2, sint32)]
    y: i32,
}

impl Point {
    pub fn at(x: i32, y: i32) -> Self {
        let mut point = Self::new();
        point.set_x(x).set_y(y);
        point
    }
}

/// One field of every kind.
#[message(retain_unknown, name = "test.Record")]
pub struct Record {
    #[field(1, int32)]
    count: i32,
    #[field(2, int64)]
    total: i64,
    #[field(3, uint32)]
    flags: u32,
    #[field(4, uint64)]
    mask: u64,
    #[field(5, sint32)]
    delta: i32,
    #[field(6, sint64)]
    offset: i64,
    #[field(7, fixed32)]
    crc: u32,
    #[field(8, fixed64)]
    stamp: u64,
    #[field(9, sfixed32)]
    lat: i32,
    #[field(10, sfixed64)]
    lon: i64,
    #[field(11, float)]
    ratio: f32,
    #[field(12, double)]
    score: f64,
    #[field(13, bool)]
    enabled: bool,
    #[field(14, string, default = "unnamed")]
    name: String,
    #[field(15, bytes)]
    payload: Vec<u8>,
    #[field(16, enumeration, default = Status::Active)]
    status: Status,
    #[field(17, message)]
    origin: Lazy<Point>,
    #[field(18, int32, repeated, packed)]
    samples: Repeated<i32>,
    #[field(19, fixed64, repeated)]
    stamps: Repeated<u64>,
    #[field(20, string, repeated)]
    tags: RepeatedString,
    #[field(21, bytes, repeated)]
    blobs: RepeatedBytes,
    #[field(22, message, repeated)]
    path: RepeatedMessage<Point>,
    #[field(23, enumeration, repeated, packed)]
    history: Repeated<Status>,
    #[field(24, sint32, default = -7)]
    bias: i32,
}

/// Subset of [`Record`] that keeps everything else as unknown bytes.
#[message(retain_unknown)]
pub struct RecordLite {
    #[field(1, int32)]
    count: i32,
    #[field(14, string)]
    name: String,
}

/// Subset of [`Record`] that drops everything else.
#[message]
pub struct RecordSkim {
    #[field(1, int32)]
    count: i32,
}

#[message]
pub struct Flags {
    #[field(1, bool)]
    enabled: bool,
    #[field(2, int32)]
    level: i32,
}

#[message]
pub struct Shape {
    #[field(1, string)]
    label: String,
    #[field(2, double, oneof = "geometry")]
    radius: f64,
    #[field(3, message, oneof = "geometry")]
    corner: Lazy<Point>,
    #[field(4, string, oneof = "geometry")]
    svg: String,
}

#[message]
pub struct Header {
    #[field(1, uint64, required)]
    id: u64,
    #[field(2, string)]
    origin: String,
}

#[message]
pub struct Envelope {
    #[field(1, message, required)]
    header: Lazy<Header>,
    #[field(2, message, repeated)]
    extras: RepeatedMessage<Header>,
    #[field(3, bytes)]
    body: Vec<u8>,
}

#[message]
pub struct Node {
    #[field(1, int32)]
    value: i32,
    #[field(2, message)]
    child: Lazy<Node>,
}

impl Node {
    /// Chain of `depth` nodes below a root, values counting up from 0.
    pub fn chain(depth: usize) -> Self {
        let mut root = Self::new();
        let mut node = &mut root;
        for value in 0..depth {
            node.set_value(value as i32);
            node = node.child_mut();
        }
        root
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self;
        while let Some(child) = node.child() {
            depth += 1;
            node = child;
        }
        depth
    }
}

#[message]
pub struct Legacy {
    #[field(1, int32)]
    id: i32,
    #[field(2, group)]
    anchor: Lazy<Point>,
    #[field(3, group, repeated)]
    points: RepeatedMessage<Point>,
}

#[message]
pub struct PackedLists {
    #[field(1, int32, repeated, packed)]
    values: Repeated<i32>,
    #[field(2, enumeration, repeated, packed)]
    statuses: Repeated<Status>,
    #[field(3, double, repeated, packed)]
    weights: Repeated<f64>,
}

#[message]
pub struct PlainLists {
    #[field(1, int32, repeated)]
    values: Repeated<i32>,
    #[field(2, enumeration, repeated)]
    statuses: Repeated<Status>,
    #[field(3, double, repeated)]
    weights: Repeated<f64>,
}

/// Field 1 as a plain int32, to feed enum numbers without a variant.
#[message]
pub struct RawCode {
    #[field(1, int32)]
    code: i32,
    #[field(2, int32, repeated)]
    codes: Repeated<i32>,
}

#[message(retain_unknown)]
pub struct TypedCode {
    #[field(1, enumeration)]
    status: Status,
    #[field(2, enumeration, repeated)]
    statuses: Repeated<Status>,
}

/// A [`Record`] with every field set.
pub fn full_record() -> Record {
    let mut record = Record::new();
    record
        .set_count(-42)
        .set_total(9_000_000_000)
        .set_flags(0xF00D)
        .set_mask(u64::MAX)
        .set_delta(-3)
        .set_offset(i64::MIN)
        .set_crc(0xDEAD_BEEF)
        .set_stamp(1_700_000_000_000)
        .set_lat(-33_868_820)
        .set_lon(151_209_296)
        .set_ratio(0.25)
        .set_score(-1.5e300)
        .set_enabled(true)
        .set_name("sensor-7")
        .set_payload(&[0, 1, 2, 0xFF])
        .set_status(Status::Retired)
        .set_bias(12);
    record.origin_mut().set_x(5).set_y(-5);
    record.samples_mut().extend([1, -1, 300, i32::MIN]);
    record.stamps_mut().extend([u64::MAX, 0]);
    record.tags_mut().push_str("alpha");
    record.tags_mut().push_str("");
    record.blobs_mut().push_slice(b"\x00\x01");
    record.path_mut().push(&Point::at(1, 2));
    record.path_mut().push(&Point::at(-3, 4));
    record.history_mut().extend([Status::Active, Status::Retired, Status::Unknown]);
    record
}
