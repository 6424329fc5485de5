// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `#[derive(ProtoEnum)]` expansion.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(input, "ProtoEnum only supports enums"));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&input.generics, "generic enums are not supported"));
    }

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(variant, "enum variants must be unit variants"));
        }
        if variant.discriminant.is_none() {
            return Err(syn::Error::new_spanned(
                variant,
                "enum variants need an explicit number, e.g. `Active = 1`",
            ));
        }
        variants.push(&variant.ident);
    }
    let Some(first) = variants.first().copied() else {
        return Err(syn::Error::new_spanned(input, "an enum needs at least one variant"));
    };

    Ok(quote! {
        impl ::quickbuf::ProtoEnum for #name {
            #[inline]
            fn number(self) -> i32 {
                self as i32
            }

            fn from_number(number: i32) -> ::core::option::Option<Self> {
                #(
                    if number == #name::#variants as i32 {
                        return ::core::option::Option::Some(#name::#variants);
                    }
                )*
                ::core::option::Option::None
            }
        }

        impl ::quickbuf::ScalarValue for #name {
            #[inline]
            fn same(self, other: Self) -> bool {
                self as i32 == other as i32
            }
        }

        /// The first declared variant, as in proto2.
        impl ::core::default::Default for #name {
            fn default() -> Self {
                #name::#first
            }
        }
    })
}
