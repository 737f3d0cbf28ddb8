use quote::ToTokens;
use std::collections::HashSet;
use syn::punctuated::Punctuated;
use syn::{Attribute, Field, Fields, FieldsNamed, Path, Token, Type};

/// 字段注入方式
#[derive(Clone, Copy)]
pub(crate) enum Placement {
    /// 所需字段统一置于最前（已存在的字段被挪动而非重复定义）
    Leading,
    /// 仅补齐缺失字段，既有字段顺序不变
    FillMissing,
}

/// 为具名字段（或单元变体）补齐必需字段
pub(crate) fn ensure_fields(fields: &mut Fields, required: &[(&str, Type)], placement: Placement) {
    if matches!(fields, Fields::Unit) {
        *fields = Fields::Named(syn::parse_quote!({}));
    }
    if let Fields::Named(named) = fields {
        ensure_named(named, required, placement);
    }
}

fn ensure_named(named: &mut FieldsNamed, required: &[(&str, Type)], placement: Placement) {
    let old: Vec<Field> = named.named.iter().cloned().collect();
    let mut rebuilt: Punctuated<Field, Token![,]> = Punctuated::new();

    for (name, ty) in required {
        match (placement, find(&old, name)) {
            (Placement::Leading, Some(existing)) => rebuilt.push(existing.clone()),
            (_, None) => rebuilt.push(make_field(name, ty)),
            (Placement::FillMissing, Some(_)) => {}
        }
    }

    for f in old {
        let is_required = field_name(&f)
            .map(|n| required.iter().any(|(r, _)| *r == n))
            .unwrap_or(false);
        if !(is_required && matches!(placement, Placement::Leading)) {
            rebuilt.push(f);
        }
    }

    named.named = rebuilt;
}

fn make_field(name: &str, ty: &Type) -> Field {
    let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
    syn::parse_quote! { #ident: #ty }
}

fn field_name(f: &Field) -> Option<String> {
    f.ident.as_ref().map(|i| i.to_string())
}

fn find<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields
        .iter()
        .find(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
}

/// 合并派生列表：required 在前，已有派生去重后追加
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<Path>) {
    let mut retained = Vec::with_capacity(attrs.len());
    let mut existing: Vec<Path> = Vec::new();

    for attr in attrs.drain(..) {
        if !attr.path().is_ident("derive") {
            retained.push(attr);
            continue;
        }
        match attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated) {
            Ok(list) => existing.extend(list),
            Err(_) => retained.push(attr),
        }
    }

    let mut seen = HashSet::new();
    let merged: Vec<Path> = required
        .into_iter()
        .chain(existing)
        .filter(|p| seen.insert(derive_key(p)))
        .collect();

    attrs.push(syn::parse_quote!(#[derive(#(#merged),*)]));
    attrs.extend(retained);
}

// `Serialize` 与 `serde::Serialize` 视为同一个派生
fn derive_key(p: &Path) -> String {
    match p.segments.last() {
        Some(last) => last.ident.to_string(),
        None => p.to_token_stream().to_string(),
    }
}

/// 把 `CamelCase` 变体名转换为 `snake_case`，作为默认事件类型名
pub(crate) fn snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_splits_on_uppercase() {
        assert_eq!(snake_case("Created"), "created");
        assert_eq!(snake_case("MatchCreated"), "match_created");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn leading_placement_moves_existing_fields_first() {
        let mut fields: Fields = Fields::Named(syn::parse_quote!({ name: String, id: u32 }));
        let id_ty: Type = syn::parse_quote!(u64);
        let ver_ty: Type = syn::parse_quote!(usize);
        ensure_fields(
            &mut fields,
            &[("id", id_ty), ("version", ver_ty)],
            Placement::Leading,
        );

        let names: Vec<String> = fields.iter().filter_map(field_name).collect();
        assert_eq!(names, vec!["id", "version", "name"]);
        // 已存在的 id 字段保留原类型
        let id_field = fields.iter().next().map(|f| f.ty.to_token_stream().to_string());
        assert_eq!(id_field.as_deref(), Some("u32"));
    }

    #[test]
    fn fill_missing_keeps_existing_order_and_converts_unit() {
        let mut fields = Fields::Unit;
        let id_ty: Type = syn::parse_quote!(String);
        ensure_fields(&mut fields, &[("id", id_ty)], Placement::FillMissing);
        let names: Vec<String> = fields.iter().filter_map(field_name).collect();
        assert_eq!(names, vec!["id"]);
    }

    #[test]
    fn derives_are_merged_without_duplicates() {
        let mut attrs: Vec<Attribute> = vec![
            syn::parse_quote!(#[derive(Clone, serde::Serialize)]),
            syn::parse_quote!(#[serde(rename_all = "lowercase")]),
        ];
        apply_derives(
            &mut attrs,
            vec![syn::parse_quote!(Debug), syn::parse_quote!(Serialize)],
        );

        assert_eq!(attrs.len(), 2);
        let derive = attrs[0].to_token_stream().to_string();
        assert_eq!(derive.matches("Serialize").count(), 1);
        assert!(derive.contains("Clone"));
        assert!(attrs[1].path().is_ident("serde"));
    }
}
