// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use quickbuf::{message, Lazy, ProtoEnum, ProtoMessage, Repeated, RepeatedMessage, RepeatedString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ProtoEnum)]
pub enum Mode {
    Off = 0,
    On = 1,
    Auto = -1,
}

#[message]
pub struct Leaf {
    #[field(1, sint64)]
    offset: i64,
    #[field(2, bytes)]
    payload: Vec<u8>,
}

#[message(retain_unknown)]
pub struct Tree {
    #[field(1, uint32, required)]
    id: u32,
    #[field(2, string)]
    label: String,
    #[field(3, enumeration, repeated, packed)]
    modes: Repeated<Mode>,
    #[field(4, fixed64, repeated)]
    stamps: Repeated<u64>,
    #[field(5, message)]
    leaf: Lazy<Leaf>,
    #[field(6, message, repeated)]
    leaves: RepeatedMessage<Leaf>,
    #[field(7, group)]
    nested: Lazy<Tree>,
    #[field(8, string, repeated)]
    names: RepeatedString,
}

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must survive a re-encode and decode again
    if let Ok(tree) = Tree::parse_from(data) {
        if let Ok(bytes) = tree.to_bytes() {
            let again = Tree::parse_from(&bytes).expect("re-encoded bytes decode");
            assert_eq!(again, tree);
        }
    }

    // Reuse path
    let mut tree = Tree::new();
    let _ = tree.merge_from_bytes(data);
    tree.clear_quick();
    let _ = tree.merge_from_bytes(data);
});
