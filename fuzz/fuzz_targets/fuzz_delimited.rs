// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use quickbuf::framing::DelimitedReader;
use quickbuf::{message, ProtoMessage, RepeatedBytes};

#[message(retain_unknown)]
pub struct Frame {
    #[field(1, int32)]
    seq: i32,
    #[field(2, bytes, repeated)]
    chunks: RepeatedBytes,
}

fuzz_target!(|data: &[u8]| {
    let mut reader = DelimitedReader::new(data);
    let mut frame = Frame::new();
    while let Ok(true) = reader.read_next(&mut frame) {
        let _ = frame.compute_serialized_size();
    }
});
