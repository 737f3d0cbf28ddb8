use quote::ToTokens;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Expr, ExprLit, Ident, Lit, Result, Token, Type};

/// `key = value` 形式的宏参数列表
///
/// 各宏按需 `take_*` 取出已知键，最后调用 `finish` 拒绝未知键。
pub(crate) struct KeyValueArgs {
    entries: Vec<(Ident, Expr)>,
    expected: &'static str,
}

impl KeyValueArgs {
    pub(crate) fn parse_with(input: ParseStream, expected: &'static str) -> Result<Self> {
        let mut entries: Vec<(Ident, Expr)> = Vec::new();
        if input.is_empty() {
            return Ok(Self { entries, expected });
        }

        let pairs = Punctuated::<KeyValue, Token![,]>::parse_terminated(input)?;
        for kv in pairs {
            if entries.iter().any(|(k, _)| *k == kv.key) {
                return Err(syn::Error::new(
                    kv.key.span(),
                    format!("duplicate key '{}' in attribute", kv.key),
                ));
            }
            entries.push((kv.key, kv.value));
        }

        Ok(Self { entries, expected })
    }

    /// 从属性 `#[name(k = v, ...)]` 中解析参数
    pub(crate) fn from_attribute(attr: &Attribute, expected: &'static str) -> Result<Self> {
        attr.parse_args_with(|input: ParseStream| Self::parse_with(input, expected))
    }

    fn take(&mut self, key: &str) -> Option<(Ident, Expr)> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos))
    }

    pub(crate) fn take_type(&mut self, key: &str) -> Result<Option<Type>> {
        match self.take(key) {
            Some((_, expr)) => syn::parse2(expr.to_token_stream()).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn take_bool(&mut self, key: &str) -> Result<Option<bool>> {
        match self.take(key) {
            Some((_, Expr::Lit(ExprLit { lit: Lit::Bool(b), .. }))) => Ok(Some(b.value())),
            Some((k, other)) => Err(syn::Error::new(
                other.span(),
                format!("expected boolean literal for '{k}'"),
            )),
            None => Ok(None),
        }
    }

    pub(crate) fn take_int(&mut self, key: &str) -> Result<Option<syn::LitInt>> {
        match self.take(key) {
            Some((_, Expr::Lit(ExprLit { lit: Lit::Int(i), .. }))) => Ok(Some(i)),
            Some((k, other)) => Err(syn::Error::new(
                other.span(),
                format!("expected integer literal for '{k}'"),
            )),
            None => Ok(None),
        }
    }

    pub(crate) fn take_str(&mut self, key: &str) -> Result<Option<syn::LitStr>> {
        match self.take(key) {
            Some((_, Expr::Lit(ExprLit { lit: Lit::Str(s), .. }))) => Ok(Some(s)),
            Some((k, other)) => Err(syn::Error::new(
                other.span(),
                format!("expected string literal for '{k}'"),
            )),
            None => Ok(None),
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.entries.into_iter().next() {
            Some((key, _)) => Err(syn::Error::new(
                key.span(),
                format!("unknown key '{key}'; expected {}", self.expected),
            )),
            None => Ok(()),
        }
    }
}

struct KeyValue {
    key: Ident,
    value: Expr,
}

impl Parse for KeyValue {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        // 类型参数（如 `id = Uuid`、`id = my::Id`）也能被解析为路径表达式
        let value: Expr = input.parse()?;
        Ok(Self { key, value })
    }
}
