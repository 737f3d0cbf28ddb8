use crate::attrs::KeyValueArgs;
use crate::support::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[value_object] 宏实现
/// - 支持结构体（具名或 tuple）与枚举
/// - 合并派生：Debug, Clone, Serialize, Deserialize, PartialEq，以及可选的 Eq/Default
/// - 参数：`debug`、`eq`、`default`，均默认 true；含浮点字段时使用 `eq = false`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as ValueObjectConfig);
    let mut input = parse_macro_input!(item as Item);

    let mut required: Vec<syn::Path> = Vec::with_capacity(7);
    if cfg.derive_debug {
        required.push(syn::parse_quote!(Debug));
    }
    required.push(syn::parse_quote!(Clone));
    if cfg.derive_default {
        required.push(syn::parse_quote!(Default));
    }
    required.push(syn::parse_quote!(PartialEq));
    if cfg.derive_eq {
        required.push(syn::parse_quote!(Eq));
    }
    required.push(syn::parse_quote!(serde::Serialize));
    required.push(syn::parse_quote!(serde::Deserialize));

    match &mut input {
        Item::Struct(st) => {
            apply_derives(&mut st.attrs, required);
            TokenStream::from(quote! { #st })
        }
        Item::Enum(en) => {
            apply_derives(&mut en.attrs, required);
            TokenStream::from(quote! { #en })
        }
        other => syn::Error::new(other.span(), "#[value_object] only supports struct or enum")
            .to_compile_error()
            .into(),
    }
}

struct ValueObjectConfig {
    derive_debug: bool,
    derive_eq: bool,
    derive_default: bool,
}

impl Parse for ValueObjectConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = KeyValueArgs::parse_with(input, "'debug' | 'eq' | 'default'")?;
        let cfg = Self {
            derive_debug: args.take_bool("debug")?.unwrap_or(true),
            derive_eq: args.take_bool("eq")?.unwrap_or(true),
            derive_default: args.take_bool("default")?.unwrap_or(true),
        };
        args.finish()?;
        Ok(cfg)
    }
}
