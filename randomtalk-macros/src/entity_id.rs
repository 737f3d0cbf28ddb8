use crate::attrs::KeyValueArgs;
use crate::support::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[entity_id] 宏实现
///
/// 仅支持单字段 tuple struct（如 `struct MatchId(String);`），生成：
/// - 派生 Default, Clone, Debug（可关闭）, PartialEq, Eq, Hash, PartialOrd, Ord,
///   以及 `#[serde(transparent)]` 的 Serialize/Deserialize
/// - `new(value)`、`into_inner()`、Display、FromStr、AsRef 与双向 From
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityIdConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity_id] only on struct")
                .to_compile_error()
                .into();
        }
    };

    let inner_ty = match &st.fields {
        syn::Fields::Unnamed(f) if f.unnamed.len() == 1 => f.unnamed[0].ty.clone(),
        other => {
            return syn::Error::new(
                other.span(),
                "#[entity_id] requires a tuple struct with exactly one field, e.g. struct X(String);",
            )
            .to_compile_error()
            .into();
        }
    };

    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Default),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(Eq),
        syn::parse_quote!(Hash),
        syn::parse_quote!(PartialOrd),
        syn::parse_quote!(Ord),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if cfg.derive_debug {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);
    st.attrs.push(syn::parse_quote!(#[serde(transparent)]));

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let out = quote! {
        #st

        impl #impl_generics #ident #ty_generics #where_clause {
            pub fn new(value: impl ::core::convert::Into<#inner_ty>) -> Self { Self(value.into()) }

            pub fn into_inner(self) -> #inner_ty { self.0 }
        }

        impl #impl_generics ::std::str::FromStr for #ident #ty_generics #where_clause
        where #inner_ty: ::std::str::FromStr
        {
            type Err = <#inner_ty as ::std::str::FromStr>::Err;
            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                s.parse::<#inner_ty>().map(Self)
            }
        }

        impl #impl_generics ::std::fmt::Display for #ident #ty_generics #where_clause
        where #inner_ty: ::std::fmt::Display
        {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl #impl_generics ::core::convert::AsRef<#inner_ty> for #ident #ty_generics #where_clause {
            fn as_ref(&self) -> &#inner_ty { &self.0 }
        }

        impl #impl_generics ::core::convert::From<#inner_ty> for #ident #ty_generics #where_clause {
            fn from(value: #inner_ty) -> Self { Self(value) }
        }

        impl #impl_generics ::core::convert::From<#ident #ty_generics> for #inner_ty #where_clause {
            fn from(value: #ident #ty_generics) -> Self { value.0 }
        }
    };

    TokenStream::from(out)
}

struct EntityIdConfig {
    derive_debug: bool,
}

impl Parse for EntityIdConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = KeyValueArgs::parse_with(input, "'debug'")?;
        let derive_debug = args.take_bool("debug")?.unwrap_or(true);
        args.finish()?;
        Ok(Self { derive_debug })
    }
}
