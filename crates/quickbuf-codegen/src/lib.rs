// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Code generation for quickbuf messages and enums.
//!
//! Use through the re-exports in `quickbuf`; generated code refers to
//! `::quickbuf` paths.

extern crate proc_macro;

mod enums;
mod message;
mod model;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, ItemStruct};

use crate::model::{Message, MessageArgs};

/// `#[message]` attribute: turns an annotated struct into a protobuf message.
///
/// Every member carries `#[field(number, type, options...)]`:
///
/// - type: `double`, `float`, `int32`, `int64`, `uint32`, `uint64`,
///   `sint32`, `sint64`, `fixed32`, `fixed64`, `sfixed32`, `sfixed64`,
///   `bool`, `enumeration`, `string`, `bytes`, `message`, `group`
/// - options: `repeated`, `required`, `packed`, `default = expr`,
///   `oneof = "name"`
///
/// Storage types follow the field: plain values for scalars and enums,
/// `String` / `Vec<u8>`, `Lazy<M>` for messages and groups, and
/// `Repeated<T>` / `RepeatedString` / `RepeatedBytes` / `RepeatedMessage<M>`
/// for repeated fields.
///
/// Message options: `retain_unknown` keeps unknown fields for re-encoding,
/// `name = "pkg.Name"` sets the descriptor name.
///
/// Example:
/// ```ignore
/// use quickbuf::{message, Lazy, RepeatedString};
///
/// #[message(retain_unknown)]
/// pub struct Envelope {
///     #[field(1, uint64, required)]
///     id: u64,
///     #[field(2, string, repeated)]
///     labels: RepeatedString,
///     #[field(3, message)]
///     header: Lazy<Header>,
/// }
/// ```
#[proc_macro_attribute]
pub fn message(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = MessageArgs::default();
    let parser = syn::meta::parser(|meta| args.parse_meta(meta));
    parse_macro_input!(attr with parser);
    let mut item = parse_macro_input!(item as ItemStruct);

    let model = match Message::from_item(&mut item, args) {
        Ok(model) => model,
        Err(err) => return err.to_compile_error().into(),
    };
    message::expand(item, &model)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// `#[derive(ProtoEnum)]`: maps unit variants with explicit discriminants
/// to protobuf enum numbers.
#[proc_macro_derive(ProtoEnum)]
pub fn derive_proto_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    enums::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
