use crate::attrs::KeyValueArgs;
use crate::support::{Placement, apply_derives, ensure_fields};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, Type, parse::Parse, parse::ParseStream, parse_macro_input};

/// #[entity] 宏实现
/// - 将 `id: IdType` 与 `version: Version` 置于字段最前（缺失则追加）
/// - 合并派生：Debug（可关闭）、Clone、Default
/// - 实现 `::randomtalk_domain::entity::Entity`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityConfig);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity] only on struct")
                .to_compile_error()
                .into();
        }
    };

    if !matches!(st.fields, syn::Fields::Named(_)) {
        return syn::Error::new(st.span(), "#[entity] only supports named-field struct")
            .to_compile_error()
            .into();
    }

    let id_type = cfg.id_ty;
    let version_ty: Type = syn::parse_quote! { ::randomtalk_domain::value_object::Version };
    ensure_fields(
        &mut st.fields,
        &[("id", id_type.clone()), ("version", version_ty)],
        Placement::Leading,
    );

    let mut required: Vec<syn::Path> = vec![syn::parse_quote!(Clone), syn::parse_quote!(Default)];
    if cfg.derive_debug {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let expanded = quote! {
        #st

        impl #impl_generics ::randomtalk_domain::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_type;

            fn new(id: Self::Id) -> Self {
                Self { id, ..::core::default::Default::default() }
            }

            fn id(&self) -> &Self::Id { &self.id }

            fn version(&self) -> ::randomtalk_domain::value_object::Version { self.version }

            fn set_version(&mut self, version: ::randomtalk_domain::value_object::Version) {
                self.version = version;
            }
        }
    };

    TokenStream::from(expanded)
}

struct EntityConfig {
    id_ty: Type,
    derive_debug: bool,
}

impl Parse for EntityConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = KeyValueArgs::parse_with(input, "'id' | 'debug'")?;
        let id_ty = args
            .take_type("id")?
            .unwrap_or_else(|| syn::parse_quote! { String });
        let derive_debug = args.take_bool("debug")?.unwrap_or(true);
        args.finish()?;

        Ok(Self {
            id_ty,
            derive_debug,
        })
    }
}
