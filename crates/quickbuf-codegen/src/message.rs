// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `#[message]` expansion.
//!
//! Every field gets its own match arm, size term and write call with the
//! wire strategy fixed at expansion time; nothing is dispatched on the
//! descriptor at runtime.

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::ItemStruct;

use crate::model::{Cardinality, Field, Kind, Message};

pub fn expand(mut item: ItemStruct, message: &Message) -> syn::Result<TokenStream> {
    let words = Literal::usize_unsuffixed(message.bit_words());
    if let syn::Fields::Named(named) = &mut item.fields {
        named
            .named
            .push(syn::Field::parse_named.parse2(quote! { __state: ::quickbuf::MessageState<#words> })?);
    }

    let ident = &message.ident;
    let descriptor = descriptor(message);
    let constructor = constructor(message);
    let accessors = message
        .fields
        .iter()
        .map(|field| accessors(message, field))
        .collect::<syn::Result<Vec<_>>>()?;
    let oneof_helpers = oneof_helpers(message);
    let merge_from = merge_from(message);
    let write_to = write_to(message);
    let compute_size = compute_size(message);
    let clear = clear(message);
    let merge_from_message = merge_from_message(message);
    let is_initialized = is_initialized(message);
    let traits = trait_impls(message);

    Ok(quote! {
        #item

        impl #ident {
            #descriptor

            #constructor

            #(#accessors)*

            #oneof_helpers
        }

        impl ::quickbuf::ProtoMessage for #ident {
            fn descriptor() -> &'static ::quickbuf::MessageDescriptor {
                static DESCRIPTOR: ::quickbuf::MessageDescriptor = #ident::DESCRIPTOR;
                &DESCRIPTOR
            }

            #merge_from

            #write_to

            #compute_size

            fn cached_size(&self) -> &::quickbuf::CachedSize {
                self.__state.cached_size()
            }

            #clear

            #merge_from_message

            #is_initialized

            fn is_empty(&self) -> bool {
                self.__state.is_clear()
            }

            fn unknown_bytes(&self) -> &[u8] {
                self.__state.unknown_bytes()
            }
        }

        #traits
    })
}

// =======================================================================
// Helpers
// =======================================================================

fn bit(field: &Field) -> Literal {
    Literal::usize_unsuffixed(field.index)
}

fn number(field: &Field) -> Literal {
    Literal::u32_unsuffixed(field.number)
}

fn tag(field: &Field) -> Literal {
    Literal::u32_unsuffixed(field.tag())
}

fn marker(kind: Kind) -> TokenStream {
    let marker = format_ident!("{}", kind.type_name());
    quote! { ::quickbuf::kind::#marker }
}

/// Value a singular field reads as while absent.
fn absent_value(field: &Field) -> TokenStream {
    match (&field.default, field.kind) {
        (Some(expr), _) => quote! { #expr },
        (None, Kind::String) => quote! { "" },
        (None, Kind::Bytes) => quote! { &[] },
        (None, _) => quote! { ::core::default::Default::default() },
    }
}

/// Initial storage value.
fn initial_value(field: &Field) -> TokenStream {
    match &field.default {
        Some(expr) if field.kind.is_scalar() || field.kind == Kind::Enum => quote! { #expr },
        _ => quote! { ::core::default::Default::default() },
    }
}

/// Unsets the other members of the field's oneof.
fn clear_siblings(message: &Message, field: &Field) -> TokenStream {
    let bits = message.siblings(field).map(bit);
    quote! { #( self.__state.unset(#bits); )* }
}

fn mut_accessor(field: &Field) -> syn::Ident {
    format_ident!("{}_mut", field.name)
}

// =======================================================================
// Inherent items
// =======================================================================

fn descriptor(message: &Message) -> TokenStream {
    let proto_name = &message.proto_name;
    let retains = message.retain_unknown;
    let words = Literal::usize_unsuffixed(message.bit_words());
    let oneofs = &message.oneofs;

    let fields = message.fields.iter().map(|field| {
        let name = &field.name;
        let number = number(field);
        let field_type = format_ident!("{}", field.kind.type_name());
        let cardinality = match field.cardinality {
            Cardinality::Optional => quote! { Optional },
            Cardinality::Required => quote! { Required },
            Cardinality::Repeated => quote! { Repeated },
        };
        let packed = field.packed;
        let oneof = match field.oneof {
            Some(index) => {
                let index = Literal::u16_unsuffixed(index);
                quote! { ::core::option::Option::Some(#index) }
            }
            None => quote! { ::core::option::Option::None },
        };
        let default = match (field.default_variant(), &field.default) {
            (Some("Enum"), Some(expr)) => quote! { ::quickbuf::DefaultValue::Enum((#expr) as i32) },
            (Some(variant), Some(expr)) => {
                let variant = format_ident!("{}", variant);
                quote! { ::quickbuf::DefaultValue::#variant(#expr) }
            }
            _ => quote! { ::quickbuf::DefaultValue::None },
        };
        quote! {
            ::quickbuf::FieldDescriptor {
                name: #name,
                number: #number,
                field_type: ::quickbuf::FieldType::#field_type,
                cardinality: ::quickbuf::Cardinality::#cardinality,
                packed: #packed,
                oneof_index: #oneof,
                default: #default,
            }
        }
    });

    let oneof_masks = (0..message.oneofs.len()).map(|index| {
        let name = format_ident!("ONEOF_{}_MASK", index);
        let index = Literal::u16_unsuffixed(index as u16);
        quote! {
            const #name: ::quickbuf::BitSet<#words> = Self::DESCRIPTOR.oneof_mask::<#words>(#index);
        }
    });

    quote! {
        pub const DESCRIPTOR: ::quickbuf::MessageDescriptor = ::quickbuf::MessageDescriptor {
            name: #proto_name,
            fields: &[#(#fields),*],
            oneofs: &[#(#oneofs),*],
            retains_unknown_fields: #retains,
        };

        const REQUIRED_MASK: ::quickbuf::BitSet<#words> = Self::DESCRIPTOR.required_mask::<#words>();

        #(#oneof_masks)*
    }
}

fn constructor(message: &Message) -> TokenStream {
    let inits = message.fields.iter().map(|field| {
        let ident = &field.ident;
        let value = if field.is_repeated() {
            quote! { ::core::default::Default::default() }
        } else {
            initial_value(field)
        };
        quote! { #ident: #value }
    });
    quote! {
        pub fn new() -> Self {
            Self {
                #(#inits,)*
                __state: ::quickbuf::MessageState::new(),
            }
        }
    }
}

fn accessors(message: &Message, field: &Field) -> syn::Result<TokenStream> {
    let ident = &field.ident;
    let ty = &field.ty;
    let i = bit(field);
    let has = format_ident!("has_{}", field.name);
    let set = format_ident!("set_{}", field.name);
    let clear = format_ident!("clear_{}", field.name);
    let get_mut = mut_accessor(field);
    let siblings = clear_siblings(message, field);

    if field.is_repeated() {
        return Ok(quote! {
            pub fn #ident(&self) -> &#ty {
                &self.#ident
            }

            pub fn #get_mut(&mut self) -> &mut #ty {
                self.__state.set(#i);
                &mut self.#ident
            }

            pub fn #has(&self) -> bool {
                self.__state.has(#i) && !self.#ident.is_empty()
            }

            pub fn #clear(&mut self) -> &mut Self {
                self.#ident.clear();
                self.__state.unset(#i);
                self
            }
        });
    }

    let presence = quote! {
        pub fn #has(&self) -> bool {
            self.__state.has(#i)
        }
    };

    let absent = absent_value(field);
    let tokens = match field.kind {
        Kind::String | Kind::Bytes => {
            let (view, fill) = if field.kind == Kind::String {
                (quote! { str }, quote! { push_str })
            } else {
                (quote! { [u8] }, quote! { extend_from_slice })
            };
            let reset = match &field.default {
                Some(expr) => quote! { self.#ident.clear(); self.#ident.#fill(#expr); },
                None => quote! { self.#ident.clear(); },
            };
            quote! {
                pub fn #ident(&self) -> &#view {
                    if self.__state.has(#i) {
                        &self.#ident
                    } else {
                        #absent
                    }
                }

                #presence

                pub fn #set(&mut self, value: &#view) -> &mut Self {
                    self.#ident.clear();
                    self.#ident.#fill(value);
                    #siblings
                    self.__state.set(#i);
                    self
                }

                /// Marks the field present; an absent field starts from its default.
                pub fn #get_mut(&mut self) -> &mut #ty {
                    if !self.__state.has(#i) {
                        #reset
                    }
                    #siblings
                    self.__state.set(#i);
                    &mut self.#ident
                }

                pub fn #clear(&mut self) -> &mut Self {
                    self.__state.unset(#i);
                    self.#ident.clear();
                    self
                }
            }
        }
        Kind::Message | Kind::Group => {
            let Some(element) = field.element_type() else {
                return Err(syn::Error::new_spanned(
                    ty,
                    "message fields must be declared as `Lazy<M>`",
                ));
            };
            quote! {
                pub fn #ident(&self) -> ::core::option::Option<&#element> {
                    if self.__state.has(#i) {
                        self.#ident.get()
                    } else {
                        ::core::option::Option::None
                    }
                }

                #presence

                /// Marks the field present, allocating the message on first use.
                pub fn #get_mut(&mut self) -> &mut #element {
                    if !self.__state.has(#i) {
                        if let ::core::option::Option::Some(stale) = self.#ident.get_mut() {
                            ::quickbuf::ProtoMessage::clear_quick(stale);
                        }
                    }
                    #siblings
                    self.__state.set(#i);
                    self.#ident.get_or_init()
                }

                pub fn #set(&mut self, value: &#element) -> &mut Self {
                    ::quickbuf::Reusable::copy_from(self.#get_mut(), value);
                    self
                }

                pub fn #clear(&mut self) -> &mut Self {
                    self.__state.unset(#i);
                    self
                }
            }
        }
        _ => {
            let reset = initial_value(field);
            quote! {
                pub fn #ident(&self) -> #ty {
                    if self.__state.has(#i) {
                        self.#ident
                    } else {
                        #absent
                    }
                }

                #presence

                pub fn #set(&mut self, value: #ty) -> &mut Self {
                    self.#ident = value;
                    #siblings
                    self.__state.set(#i);
                    self
                }

                pub fn #clear(&mut self) -> &mut Self {
                    self.__state.unset(#i);
                    self.#ident = #reset;
                    self
                }
            }
        }
    };
    Ok(tokens)
}

fn oneof_helpers(message: &Message) -> TokenStream {
    let helpers = message.oneofs.iter().enumerate().map(|(index, name)| {
        let has = format_ident!("has_{}", name);
        let clear = format_ident!("clear_{}", name);
        let case = format_ident!("{}_case", name);
        let mask = format_ident!("ONEOF_{}_MASK", index);
        let members: Vec<&Field> = message.oneof_members(index as u16).collect();
        let bits: Vec<Literal> = members.iter().map(|f| bit(f)).collect();
        let numbers: Vec<Literal> = members.iter().map(|f| number(f)).collect();
        quote! {
            pub fn #has(&self) -> bool {
                self.__state.bits().intersects(&Self::#mask)
            }

            pub fn #clear(&mut self) -> &mut Self {
                #( self.__state.unset(#bits); )*
                self
            }

            /// Field number of the member that is set.
            pub fn #case(&self) -> ::core::option::Option<u32> {
                #(
                    if self.__state.has(#bits) {
                        return ::core::option::Option::Some(#numbers);
                    }
                )*
                ::core::option::Option::None
            }
        }
    });
    quote! { #(#helpers)* }
}

// =======================================================================
// Decode
// =======================================================================

fn merge_from(message: &Message) -> TokenStream {
    let arms = message.fields.iter().map(|field| merge_arm(message, field));
    let fallback = if message.retain_unknown {
        quote! { input.skip_field_retaining(tag, self.__state.unknown_mut())? }
    } else {
        quote! { input.skip_field(tag)? }
    };
    quote! {
        fn merge_from<B: ::quickbuf::ReadBackend>(
            &mut self,
            input: &mut ::quickbuf::Source<B>,
        ) -> ::quickbuf::Result<()> {
            let mut tag = input.read_tag()?;
            loop {
                match tag {
                    0 => return ::core::result::Result::Ok(()),
                    #(#arms)*
                    _ => {
                        if !#fallback {
                            return ::core::result::Result::Ok(());
                        }
                        tag = input.read_tag()?;
                    }
                }
            }
        }
    }
}

fn merge_arm(message: &Message, field: &Field) -> TokenStream {
    let ident = &field.ident;
    let i = bit(field);
    let n = number(field);
    let t = tag(field);
    let siblings = clear_siblings(message, field);
    let get_mut = mut_accessor(field);
    let unknown_enums = if message.retain_unknown {
        quote! { ::core::option::Option::Some(self.__state.unknown_mut()) }
    } else {
        quote! { ::core::option::Option::None }
    };

    if field.is_repeated() {
        let packed_tag = Literal::u32_unsuffixed(field.packed_tag());
        return match field.kind {
            kind if kind.is_scalar() => {
                let m = marker(kind);
                quote! {
                    #packed_tag => {
                        input.read_packed::<#m>(&mut self.#ident)?;
                        self.__state.set(#i);
                        tag = input.read_tag()?;
                    }
                    #t => {
                        self.__state.set(#i);
                        tag = input.read_repeated::<#m>(&mut self.#ident, #t)?;
                    }
                }
            }
            Kind::Enum => quote! {
                #packed_tag => {
                    input.read_packed_enum(&mut self.#ident, #t, #unknown_enums)?;
                    self.__state.set(#i);
                    tag = input.read_tag()?;
                }
                #t => {
                    self.__state.set(#i);
                    tag = input.read_repeated_enum(&mut self.#ident, #t, #unknown_enums)?;
                }
            },
            kind => {
                let read = match kind {
                    Kind::String => quote! { read_repeated_strings },
                    Kind::Bytes => quote! { read_repeated_bytes },
                    Kind::Message => quote! { read_repeated_messages },
                    _ => quote! { read_repeated_groups },
                };
                quote! {
                    #t => {
                        self.__state.set(#i);
                        tag = input.#read(&mut self.#ident, #t)?;
                    }
                }
            }
        };
    }

    let body = match field.kind {
        kind if kind.is_scalar() => {
            let m = marker(kind);
            quote! {
                self.#ident = input.read::<#m>()?;
                #siblings
                self.__state.set(#i);
            }
        }
        Kind::Enum => {
            let unknown = if message.retain_unknown {
                quote! { input.skip_enum(tag, value, self.__state.unknown_mut()); }
            } else {
                quote! {}
            };
            quote! {
                let value = input.read_enum_number()?;
                match ::quickbuf::ProtoEnum::from_number(value) {
                    ::core::option::Option::Some(variant) => {
                        self.#ident = variant;
                        #siblings
                        self.__state.set(#i);
                    }
                    ::core::option::Option::None => {
                        #unknown
                    }
                }
            }
        }
        Kind::String => quote! {
            input.read_string(&mut self.#ident)?;
            #siblings
            self.__state.set(#i);
        },
        Kind::Bytes => quote! {
            input.read_bytes(&mut self.#ident)?;
            #siblings
            self.__state.set(#i);
        },
        Kind::Message => quote! {
            input.read_message(self.#get_mut())?;
        },
        _ => quote! {
            input.read_group(self.#get_mut(), #n)?;
        },
    };
    quote! {
        #t => {
            #body
            tag = input.read_tag()?;
        }
    }
}

// =======================================================================
// Encode
// =======================================================================

fn write_to(message: &Message) -> TokenStream {
    let proto_name = &message.proto_name;
    let required: Vec<&Field> = message
        .fields
        .iter()
        .filter(|f| f.cardinality == Cardinality::Required)
        .collect();
    let required_check = if required.is_empty() {
        quote! {}
    } else {
        let bits = required.iter().map(|f| bit(f));
        let names = required.iter().map(|f| &f.name);
        quote! {
            if !self.__state.bits().contains_all(&Self::REQUIRED_MASK) {
                #(
                    if !self.__state.has(#bits) {
                        return ::core::result::Result::Err(::quickbuf::Error::MissingRequiredField {
                            message: #proto_name,
                            field: #names,
                        });
                    }
                )*
            }
        }
    };

    let writes = message.fields.iter().map(write_field);
    let unknown = if message.retain_unknown {
        quote! { output.write_raw_bytes(self.__state.unknown_bytes())?; }
    } else {
        quote! {}
    };

    quote! {
        fn write_to<B: ::quickbuf::WriteBackend>(
            &self,
            output: &mut ::quickbuf::Sink<B>,
        ) -> ::quickbuf::Result<()> {
            #required_check
            #(#writes)*
            #unknown
            ::core::result::Result::Ok(())
        }
    }
}

fn write_field(field: &Field) -> TokenStream {
    let ident = &field.ident;
    let i = bit(field);
    let n = number(field);

    if field.is_repeated() {
        return match field.kind {
            Kind::Enum if field.packed => quote! { output.write_packed_enum(#n, &self.#ident)?; },
            Kind::Enum => quote! { output.write_repeated_enum(#n, &self.#ident)?; },
            Kind::String => quote! { output.write_repeated_strings(#n, &self.#ident)?; },
            Kind::Bytes => quote! { output.write_repeated_bytes(#n, &self.#ident)?; },
            Kind::Message => quote! { output.write_repeated_messages(#n, &self.#ident)?; },
            Kind::Group => quote! { output.write_repeated_groups(#n, &self.#ident)?; },
            kind => {
                let m = marker(kind);
                if field.packed {
                    quote! { output.write_packed::<#m>(#n, &self.#ident)?; }
                } else {
                    quote! { output.write_repeated::<#m>(#n, &self.#ident)?; }
                }
            }
        };
    }

    let write = match field.kind {
        Kind::Enum => quote! { output.write_enum(#n, self.#ident)?; },
        Kind::String => quote! { output.write_string(#n, &self.#ident)?; },
        Kind::Bytes => quote! { output.write_bytes(#n, &self.#ident)?; },
        Kind::Message => quote! {
            if let ::core::option::Option::Some(value) = self.#ident.get() {
                output.write_message(#n, value)?;
            }
        },
        Kind::Group => quote! {
            if let ::core::option::Option::Some(value) = self.#ident.get() {
                output.write_group(#n, value)?;
            }
        },
        kind => {
            let m = marker(kind);
            quote! { output.write_field::<#m>(#n, self.#ident)?; }
        }
    };
    quote! {
        if self.__state.has(#i) {
            #write
        }
    }
}

fn compute_size(message: &Message) -> TokenStream {
    let terms = message.fields.iter().map(size_term);
    quote! {
        fn compute_serialized_size(&self) -> usize {
            let mut size = self.__state.unknown_bytes().len();
            #(#terms)*
            self.__state.cached_size().set(size);
            size
        }
    }
}

fn size_term(field: &Field) -> TokenStream {
    let ident = &field.ident;
    let i = bit(field);
    let n = number(field);

    if field.is_repeated() {
        let term = match field.kind {
            Kind::Enum if field.packed => quote! { ::quickbuf::size::packed_enums(#n, &self.#ident) },
            Kind::Enum => quote! { ::quickbuf::size::repeated_enums(#n, &self.#ident) },
            Kind::String => quote! { ::quickbuf::size::repeated_strings(#n, &self.#ident) },
            Kind::Bytes => quote! { ::quickbuf::size::repeated_bytes(#n, &self.#ident) },
            Kind::Message => quote! { ::quickbuf::size::repeated_messages(#n, &self.#ident) },
            Kind::Group => quote! { ::quickbuf::size::repeated_groups(#n, &self.#ident) },
            kind => {
                let m = marker(kind);
                if field.packed {
                    quote! { ::quickbuf::size::packed::<#m>(#n, &self.#ident) }
                } else {
                    quote! { ::quickbuf::size::repeated::<#m>(#n, &self.#ident) }
                }
            }
        };
        return quote! { size += #term; };
    }

    let term = match field.kind {
        Kind::Enum => quote! { size += ::quickbuf::size::enumeration(#n, self.#ident); },
        Kind::String => quote! { size += ::quickbuf::size::string(#n, &self.#ident); },
        Kind::Bytes => quote! { size += ::quickbuf::size::bytes(#n, &self.#ident); },
        Kind::Message => quote! {
            if let ::core::option::Option::Some(value) = self.#ident.get() {
                size += ::quickbuf::size::message(#n, value);
            }
        },
        Kind::Group => quote! {
            if let ::core::option::Option::Some(value) = self.#ident.get() {
                size += ::quickbuf::size::group(#n, value);
            }
        },
        kind => {
            let m = marker(kind);
            quote! { size += ::quickbuf::size::field::<#m>(#n, self.#ident); }
        }
    };
    quote! {
        if self.__state.has(#i) {
            #term
        }
    }
}

// =======================================================================
// Lifecycle
// =======================================================================

fn clear(message: &Message) -> TokenStream {
    let full = message.fields.iter().map(|field| {
        let ident = &field.ident;
        match field.kind {
            _ if field.is_repeated() => quote! { self.#ident.clear(); },
            Kind::String | Kind::Bytes => quote! { self.#ident.clear(); },
            Kind::Message | Kind::Group => quote! {
                if let ::core::option::Option::Some(value) = self.#ident.get_mut() {
                    ::quickbuf::ProtoMessage::clear(value);
                }
            },
            _ => {
                let value = initial_value(field);
                quote! { self.#ident = #value; }
            }
        }
    });
    let quick = message
        .fields
        .iter()
        .filter(|f| f.is_repeated())
        .map(|field| {
            let ident = &field.ident;
            quote! { self.#ident.clear(); }
        });
    quote! {
        fn clear(&mut self) {
            if self.__state.is_clear() {
                return;
            }
            #(#full)*
            self.__state.reset();
        }

        fn clear_quick(&mut self) {
            if self.__state.is_clear() {
                return;
            }
            #(#quick)*
            self.__state.reset();
        }
    }
}

fn merge_from_message(message: &Message) -> TokenStream {
    let merges = message.fields.iter().map(|field| {
        let ident = &field.ident;
        let i = bit(field);
        let siblings = clear_siblings(message, field);
        let get_mut = mut_accessor(field);
        match field.kind {
            kind if field.is_repeated() && (kind.is_scalar() || kind == Kind::Enum) => quote! {
                if !other.#ident.is_empty() {
                    self.#ident.extend_from_slice(&other.#ident);
                    self.__state.set(#i);
                }
            },
            _ if field.is_repeated() => quote! {
                if !other.#ident.is_empty() {
                    self.#ident.extend_from(&other.#ident);
                    self.__state.set(#i);
                }
            },
            Kind::String | Kind::Bytes => quote! {
                if other.__state.has(#i) {
                    ::quickbuf::Reusable::copy_from(&mut self.#ident, &other.#ident);
                    #siblings
                    self.__state.set(#i);
                }
            },
            Kind::Message | Kind::Group => quote! {
                if other.__state.has(#i) {
                    if let ::core::option::Option::Some(value) = other.#ident.get() {
                        ::quickbuf::ProtoMessage::merge_from_message(self.#get_mut(), value);
                    }
                }
            },
            _ => quote! {
                if other.__state.has(#i) {
                    self.#ident = other.#ident;
                    #siblings
                    self.__state.set(#i);
                }
            },
        }
    });
    quote! {
        fn merge_from_message(&mut self, other: &Self) {
            #(#merges)*
            if !other.__state.unknown_bytes().is_empty() {
                self.__state.unknown_mut().extend_from_slice(other.__state.unknown_bytes());
            }
        }
    }
}

fn is_initialized(message: &Message) -> TokenStream {
    let nested = message
        .fields
        .iter()
        .filter(|f| f.kind.is_message())
        .map(|field| {
            let ident = &field.ident;
            let i = bit(field);
            if field.is_repeated() {
                quote! {
                    if !self.#ident.iter().all(::quickbuf::ProtoMessage::is_initialized) {
                        return false;
                    }
                }
            } else {
                quote! {
                    if self.__state.has(#i) {
                        if let ::core::option::Option::Some(value) = self.#ident.get() {
                            if !::quickbuf::ProtoMessage::is_initialized(value) {
                                return false;
                            }
                        }
                    }
                }
            }
        });
    quote! {
        fn is_initialized(&self) -> bool {
            if !self.__state.bits().contains_all(&Self::REQUIRED_MASK) {
                return false;
            }
            #(#nested)*
            true
        }
    }
}

// =======================================================================
// Std traits
// =======================================================================

fn trait_impls(message: &Message) -> TokenStream {
    let ident = &message.ident;
    let proto_name = &message.proto_name;
    let struct_name = ident.to_string();

    let comparisons = message.fields.iter().map(|field| {
        let ident = &field.ident;
        let i = bit(field);
        if field.is_repeated() {
            return quote! { self.#ident == other.#ident };
        }
        let same = match field.kind {
            kind if kind.is_scalar() || kind == Kind::Enum => {
                quote! { ::quickbuf::ScalarValue::same(self.#ident, other.#ident) }
            }
            Kind::String | Kind::Bytes => quote! { self.#ident == other.#ident },
            _ => quote! { self.#ident.get() == other.#ident.get() },
        };
        quote! {
            (self.__state.has(#i) == other.__state.has(#i) && (!self.__state.has(#i) || #same))
        }
    });

    let debug_fields = message.fields.iter().map(|field| {
        let ident = &field.ident;
        let name = &field.name;
        let i = bit(field);
        if field.is_repeated() {
            quote! {
                if !self.#ident.is_empty() {
                    out.field(#name, &self.#ident);
                }
            }
        } else if field.kind.is_message() {
            quote! {
                if self.__state.has(#i) {
                    if let ::core::option::Option::Some(value) = self.#ident.get() {
                        out.field(#name, value);
                    }
                }
            }
        } else {
            quote! {
                if self.__state.has(#i) {
                    out.field(#name, &self.#ident);
                }
            }
        }
    });

    let copies = message.fields.iter().map(|field| {
        let ident = &field.ident;
        match field.kind {
            _ if field.is_repeated() => quote! { self.#ident.copy_from(&other.#ident); },
            Kind::String | Kind::Bytes => quote! {
                ::quickbuf::Reusable::copy_from(&mut self.#ident, &other.#ident);
            },
            Kind::Message | Kind::Group => quote! {
                if let ::core::option::Option::Some(value) = other.#ident.get() {
                    ::quickbuf::Reusable::copy_from(self.#ident.get_or_init(), value);
                }
            },
            _ => quote! { self.#ident = other.#ident; },
        }
    });

    quote! {
        impl ::core::default::Default for #ident {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::quickbuf::Reusable for #ident {
            fn reset(&mut self) {
                ::quickbuf::ProtoMessage::clear_quick(self);
            }

            fn copy_from(&mut self, other: &Self) {
                #(#copies)*
                self.__state.copy_from(&other.__state);
            }
        }

        impl ::core::clone::Clone for #ident {
            fn clone(&self) -> Self {
                let mut copy = Self::new();
                ::quickbuf::Reusable::copy_from(&mut copy, self);
                copy
            }
        }

        impl ::core::cmp::PartialEq for #ident {
            fn eq(&self, other: &Self) -> bool {
                true #(&& #comparisons)*
            }
        }

        impl ::core::cmp::Eq for #ident {}

        impl ::core::hash::Hash for #ident {
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                ::core::hash::Hash::hash(#proto_name, state);
            }
        }

        impl ::core::fmt::Debug for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                let mut out = f.debug_struct(#struct_name);
                #(#debug_fields)*
                out.finish()
            }
        }
    }
}
