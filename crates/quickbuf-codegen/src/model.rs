// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parsed form of a `#[message]` struct and its `#[field(...)]` attributes.

use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Expr, GenericArgument, Ident, ItemStruct, LitInt, LitStr, PathArguments, Token, Type};

const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;
const RESERVED_NUMBERS: core::ops::RangeInclusive<u32> = 19_000..=19_999;

/// Protobuf field type as written in `#[field(N, kind)]`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Kind {
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

impl Kind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "double" => Kind::Double,
            "float" => Kind::Float,
            "int32" => Kind::Int32,
            "int64" => Kind::Int64,
            "uint32" => Kind::UInt32,
            "uint64" => Kind::UInt64,
            "sint32" => Kind::SInt32,
            "sint64" => Kind::SInt64,
            "fixed32" => Kind::Fixed32,
            "fixed64" => Kind::Fixed64,
            "sfixed32" => Kind::SFixed32,
            "sfixed64" => Kind::SFixed64,
            "bool" => Kind::Bool,
            "enumeration" => Kind::Enum,
            "string" => Kind::String,
            "bytes" => Kind::Bytes,
            "message" => Kind::Message,
            "group" => Kind::Group,
            _ => return None,
        })
    }

    /// `quickbuf::descriptor::FieldType` variant; scalars reuse it as the
    /// `quickbuf::kind` marker name.
    pub fn type_name(self) -> &'static str {
        match self {
            Kind::Double => "Double",
            Kind::Float => "Float",
            Kind::Int32 => "Int32",
            Kind::Int64 => "Int64",
            Kind::UInt32 => "UInt32",
            Kind::UInt64 => "UInt64",
            Kind::SInt32 => "SInt32",
            Kind::SInt64 => "SInt64",
            Kind::Fixed32 => "Fixed32",
            Kind::Fixed64 => "Fixed64",
            Kind::SFixed32 => "SFixed32",
            Kind::SFixed64 => "SFixed64",
            Kind::Bool => "Bool",
            Kind::Enum => "Enum",
            Kind::String => "String",
            Kind::Bytes => "Bytes",
            Kind::Message => "Message",
            Kind::Group => "Group",
        }
    }

    pub fn is_scalar(self) -> bool {
        !matches!(
            self,
            Kind::Enum | Kind::String | Kind::Bytes | Kind::Message | Kind::Group
        )
    }

    pub fn is_packable(self) -> bool {
        self.is_scalar() || self == Kind::Enum
    }

    pub fn is_message(self) -> bool {
        matches!(self, Kind::Message | Kind::Group)
    }

    pub fn wire_type(self) -> u32 {
        match self {
            Kind::Double | Kind::Fixed64 | Kind::SFixed64 => 1,
            Kind::Float | Kind::Fixed32 | Kind::SFixed32 => 5,
            Kind::String | Kind::Bytes | Kind::Message => 2,
            Kind::Group => 3,
            _ => 0,
        }
    }

    /// `quickbuf::DefaultValue` variant holding an explicit default.
    fn default_variant(self) -> Option<&'static str> {
        Some(match self {
            Kind::Double => "Double",
            Kind::Float => "Float",
            Kind::Int32 | Kind::SInt32 | Kind::SFixed32 => "Int32",
            Kind::Int64 | Kind::SInt64 | Kind::SFixed64 => "Int64",
            Kind::UInt32 | Kind::Fixed32 => "UInt32",
            Kind::UInt64 | Kind::Fixed64 => "UInt64",
            Kind::Bool => "Bool",
            Kind::Enum => "Enum",
            Kind::String => "String",
            Kind::Bytes => "Bytes",
            Kind::Message | Kind::Group => return None,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
}

/// One `#[field]`-annotated struct member.
pub struct Field {
    pub ident: Ident,
    /// Name without a raw-identifier prefix, used for accessor names.
    pub name: String,
    pub ty: Type,
    pub number: u32,
    pub kind: Kind,
    pub cardinality: Cardinality,
    pub packed: bool,
    pub default: Option<Expr>,
    pub oneof: Option<u16>,
    /// Declaration position, which is also the presence bit.
    pub index: usize,
}

impl Field {
    pub fn tag(&self) -> u32 {
        (self.number << 3) | self.kind.wire_type()
    }

    pub fn packed_tag(&self) -> u32 {
        (self.number << 3) | 2
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn default_variant(&self) -> Option<&'static str> {
        self.default.as_ref().and_then(|_| self.kind.default_variant())
    }

    /// `M` of a `Lazy<M>` or `RepeatedMessage<M>` member.
    pub fn element_type(&self) -> Option<&Type> {
        let Type::Path(path) = &self.ty else {
            return None;
        };
        let segment = path.path.segments.last()?;
        let PathArguments::AngleBracketed(args) = &segment.arguments else {
            return None;
        };
        args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
    }
}

/// `#[message(...)]` options.
#[derive(Default)]
pub struct MessageArgs {
    pub retain_unknown: bool,
    pub name: Option<String>,
}

impl MessageArgs {
    pub fn parse_meta(&mut self, meta: syn::meta::ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("retain_unknown") {
            self.retain_unknown = true;
            Ok(())
        } else if meta.path.is_ident("name") {
            self.name = Some(meta.value()?.parse::<LitStr>()?.value());
            Ok(())
        } else {
            Err(meta.error("unsupported message option, expected `retain_unknown` or `name = \"...\"`"))
        }
    }
}

/// Validated message model.
pub struct Message {
    pub ident: Ident,
    pub proto_name: String,
    pub retain_unknown: bool,
    pub fields: Vec<Field>,
    pub oneofs: Vec<String>,
}

impl Message {
    /// Collects and validates the `#[field]` members, stripping the attributes from `item`.
    pub fn from_item(item: &mut ItemStruct, args: MessageArgs) -> syn::Result<Self> {
        if !item.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &item.generics,
                "generic messages are not supported",
            ));
        }
        let syn::Fields::Named(named) = &mut item.fields else {
            return Err(syn::Error::new_spanned(
                &item.ident,
                "Only structs with named fields are supported",
            ));
        };

        let mut fields: Vec<Field> = Vec::new();
        let mut oneofs: Vec<String> = Vec::new();
        for member in &mut named.named {
            let Some(ident) = member.ident.clone() else {
                return Err(syn::Error::new_spanned(&*member, "Field must have a name"));
            };
            let position = member
                .attrs
                .iter()
                .position(|attr| attr.path().is_ident("field"));
            let Some(position) = position else {
                return Err(syn::Error::new_spanned(
                    &ident,
                    "missing #[field(number, type, ...)] attribute",
                ));
            };
            let attr = member.attrs.remove(position);
            let field = parse_field(&attr, ident, member.ty.clone(), fields.len(), &mut oneofs)?;

            if let Some(previous) = fields.iter().find(|f| f.number == field.number) {
                return Err(syn::Error::new_spanned(
                    &field.ident,
                    format!("field number {} is already used by `{}`", field.number, previous.name),
                ));
            }
            fields.push(field);
        }
        if oneofs.len() > usize::from(u16::MAX) {
            return Err(syn::Error::new_spanned(&item.ident, "too many oneof groups"));
        }

        Ok(Self {
            proto_name: args.name.unwrap_or_else(|| item.ident.unraw().to_string()),
            ident: item.ident.clone(),
            retain_unknown: args.retain_unknown,
            fields,
            oneofs,
        })
    }

    /// Words of the presence bit-set.
    pub fn bit_words(&self) -> usize {
        self.fields.len().div_ceil(64).max(1)
    }

    pub fn oneof_members(&self, oneof: u16) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.oneof == Some(oneof))
    }

    /// Other members of `field`'s oneof.
    pub fn siblings<'a>(&'a self, field: &'a Field) -> impl Iterator<Item = &'a Field> {
        self.fields
            .iter()
            .filter(move |f| f.oneof.is_some() && f.oneof == field.oneof && f.index != field.index)
    }
}

/// `#[field(N, kind, opts...)]` argument list.
struct FieldArgs {
    number: LitInt,
    kind: Ident,
    options: Vec<(Ident, Option<Expr>)>,
}

impl Parse for FieldArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let number: LitInt = input.parse()?;
        input.parse::<Token![,]>()?;
        let kind = Ident::parse_any(input)?;
        let mut options = Vec::new();
        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let key = Ident::parse_any(input)?;
            let value = if input.peek(Token![=]) {
                input.parse::<Token![=]>()?;
                Some(input.parse::<Expr>()?)
            } else {
                None
            };
            options.push((key, value));
        }
        Ok(Self {
            number,
            kind,
            options,
        })
    }
}

fn parse_field(
    attr: &Attribute,
    ident: Ident,
    ty: Type,
    index: usize,
    oneofs: &mut Vec<String>,
) -> syn::Result<Field> {
    let args: FieldArgs = attr.parse_args()?;

    let number: u32 = args.number.base10_parse()?;
    if number == 0 || number > MAX_FIELD_NUMBER {
        return Err(syn::Error::new_spanned(
            &args.number,
            format!("field number must be in 1..={MAX_FIELD_NUMBER}"),
        ));
    }
    if RESERVED_NUMBERS.contains(&number) {
        return Err(syn::Error::new_spanned(
            &args.number,
            "field numbers 19000..=19999 are reserved",
        ));
    }

    let Some(kind) = Kind::from_keyword(&args.kind.to_string()) else {
        return Err(syn::Error::new_spanned(
            &args.kind,
            format!("unknown field type `{}`", args.kind),
        ));
    };

    let mut cardinality = Cardinality::Optional;
    let mut packed = false;
    let mut default = None;
    let mut oneof = None;
    for (key, value) in args.options {
        match (key.to_string().as_str(), value) {
            ("repeated", None) | ("required", None) if cardinality != Cardinality::Optional => {
                return Err(syn::Error::new_spanned(key, "`repeated` and `required` are exclusive"));
            }
            ("repeated", None) => cardinality = Cardinality::Repeated,
            ("required", None) => cardinality = Cardinality::Required,
            ("packed", None) => packed = true,
            ("default", Some(expr)) => default = Some(expr),
            ("oneof", Some(Expr::Lit(lit))) => {
                let syn::Lit::Str(group) = &lit.lit else {
                    return Err(syn::Error::new_spanned(lit, "expected `oneof = \"name\"`"));
                };
                let group = group.value();
                let position = match oneofs.iter().position(|g| *g == group) {
                    Some(position) => position,
                    None => {
                        oneofs.push(group);
                        oneofs.len() - 1
                    }
                };
                oneof = u16::try_from(position).ok();
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    key,
                    "unsupported field option, expected `repeated`, `required`, `packed`, `default = ...` or `oneof = \"...\"`",
                ));
            }
        }
    }

    let span_target = &ident;
    if packed && (cardinality != Cardinality::Repeated || !kind.is_packable()) {
        return Err(syn::Error::new_spanned(
            span_target,
            "only repeated scalar and enum fields can be packed",
        ));
    }
    if default.is_some() && (cardinality == Cardinality::Repeated || kind.is_message()) {
        return Err(syn::Error::new_spanned(
            span_target,
            "defaults are only allowed on singular scalar, enum, string and bytes fields",
        ));
    }
    if oneof.is_some() && cardinality != Cardinality::Optional {
        return Err(syn::Error::new_spanned(
            span_target,
            "oneof members cannot be repeated or required",
        ));
    }

    Ok(Field {
        name: ident.unraw().to_string(),
        ident,
        ty,
        number,
        kind,
        cardinality,
        packed,
        default,
        oneof,
        index,
    })
}
