use crate::attrs::KeyValueArgs;
use crate::support::{Placement, apply_derives, ensure_fields, snake_case};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, Type, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[domain_event] 宏实现
/// - 支持具名字段变体与单元变体（单元变体被改写为具名变体）
/// - 补齐字段：`id: IdType`, `aggregate_version: Version`
/// - 合并派生：Debug, Clone, PartialEq, Serialize, Deserialize
/// - 生成 `::randomtalk_domain::domain_event::DomainEvent` 实现与 `EVENT_TYPES` 常量
/// - 枚举级参数：`#[domain_event(id = IdType, version = N)]`
/// - 变体级覆写：`#[event(event_type = "...", event_version = N)]`；默认类型名为变体名的 snake_case
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventConfig);
    let mut input = parse_macro_input!(item as Item);

    let enum_item = match &mut input {
        Item::Enum(e) => e,
        other => {
            return syn::Error::new(other.span(), "#[domain_event] can only be used on enum types")
                .to_compile_error()
                .into();
        }
    };

    apply_derives(
        &mut enum_item.attrs,
        vec![
            syn::parse_quote!(Debug),
            syn::parse_quote!(Clone),
            syn::parse_quote!(PartialEq),
            syn::parse_quote!(serde::Serialize),
            syn::parse_quote!(serde::Deserialize),
        ],
    );

    let version_ty: Type = syn::parse_quote! { ::randomtalk_domain::value_object::Version };
    let mut specs: Vec<VariantSpec> = Vec::with_capacity(enum_item.variants.len());

    for v in &mut enum_item.variants {
        if matches!(v.fields, syn::Fields::Unnamed(_)) {
            return syn::Error::new(
                v.span(),
                "#[domain_event] supports named-field or unit variants, e.g. Variant { x: T }",
            )
            .to_compile_error()
            .into();
        }

        ensure_fields(
            &mut v.fields,
            &[
                ("id", cfg.id_ty.clone()),
                ("aggregate_version", version_ty.clone()),
            ],
            Placement::FillMissing,
        );

        let mut spec = VariantSpec {
            ident: v.ident.clone(),
            event_type: None,
            event_version: None,
        };

        let mut retained = Vec::with_capacity(v.attrs.len());
        for attr in v.attrs.drain(..) {
            if !attr.path().is_ident("event") {
                retained.push(attr);
                continue;
            }
            let parsed = KeyValueArgs::from_attribute(&attr, "'event_type' | 'event_version'")
                .and_then(|mut args| {
                    let ty = args.take_str("event_type")?;
                    let ver = args.take_int("event_version")?;
                    args.finish()?;
                    Ok((ty, ver))
                });
            match parsed {
                Ok((ty, ver)) => {
                    if (ty.is_some() && spec.event_type.is_some())
                        || (ver.is_some() && spec.event_version.is_some())
                    {
                        return syn::Error::new(
                            attr.span(),
                            "duplicate #[event(...)] override for this variant",
                        )
                        .to_compile_error()
                        .into();
                    }
                    spec.event_type = spec.event_type.or(ty);
                    spec.event_version = spec.event_version.or(ver);
                }
                Err(err) => return err.to_compile_error().into(),
            }
        }
        v.attrs = retained;
        specs.push(spec);
    }

    let enum_ident = &enum_item.ident;
    let default_version = &cfg.version;

    let type_lits: Vec<syn::LitStr> = specs
        .iter()
        .map(|s| {
            s.event_type.clone().unwrap_or_else(|| {
                syn::LitStr::new(&snake_case(&s.ident.to_string()), s.ident.span())
            })
        })
        .collect();

    let idents: Vec<&syn::Ident> = specs.iter().map(|s| &s.ident).collect();
    let versions: Vec<syn::LitInt> = specs
        .iter()
        .map(|s| s.event_version.clone().unwrap_or_else(|| default_version.clone()))
        .collect();

    let out = quote! {
        #enum_item

        impl ::randomtalk_domain::domain_event::DomainEvent for #enum_ident {
            const EVENT_TYPES: &'static [&'static str] = &[ #( #type_lits ),* ];

            fn event_id(&self) -> &str {
                match self { #( Self::#idents { id, .. } => ::core::convert::AsRef::<str>::as_ref(id), )* }
            }

            fn event_type(&self) -> &'static str {
                match self { #( Self::#idents { .. } => #type_lits, )* }
            }

            fn event_version(&self) -> usize {
                match self { #( Self::#idents { .. } => #versions, )* }
            }

            fn aggregate_version(&self) -> ::randomtalk_domain::value_object::Version {
                match self { #( Self::#idents { aggregate_version, .. } => *aggregate_version, )* }
            }
        }
    };

    TokenStream::from(out)
}

struct VariantSpec {
    ident: syn::Ident,
    event_type: Option<syn::LitStr>,
    event_version: Option<syn::LitInt>,
}

struct EventConfig {
    id_ty: Type,
    version: syn::LitInt,
}

impl Parse for EventConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = KeyValueArgs::parse_with(input, "'id' | 'version'")?;
        let id_ty = args
            .take_type("id")?
            .unwrap_or_else(|| syn::parse_quote! { String });
        let version = args
            .take_int("version")?
            .unwrap_or_else(|| syn::parse_quote! { 1 });
        args.finish()?;
        Ok(Self { id_ty, version })
    }
}
