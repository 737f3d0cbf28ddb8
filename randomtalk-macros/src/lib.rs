//! randomtalk 领域建模过程宏
//!
//! - `#[entity]`：为聚合/实体注入 `id`、`version` 字段并实现 `Entity`
//! - `#[entity_id]`：为单字段 tuple struct 生成强类型标识
//! - `#[domain_event]`：为事件枚举注入 `id`、`aggregate_version` 并实现 `DomainEvent`
//! - `#[value_object]`：为值对象合并常用派生
//!
//! 生成代码通过 `::randomtalk_domain` 路径引用领域层 trait，
//! 使用方需依赖 `randomtalk-domain` 与 `serde`。
use proc_macro::TokenStream;

mod attrs;
mod domain_event;
mod entity;
mod entity_id;
mod support;
mod value_object;

/// 实体宏
///
/// ```ignore
/// #[entity(id = MatchId)]
/// pub struct Match { requester: Option<UserSnapshot> }
/// ```
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}

/// 实体标识宏，仅支持单字段 tuple struct
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}

/// 领域事件宏
///
/// ```ignore
/// #[domain_event(version = 1)]
/// pub enum MatchEvent {
///     #[event(event_type = "match_created")]
///     Created { match_id: MatchId },
/// }
/// ```
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}

/// 值对象宏
#[proc_macro_attribute]
pub fn value_object(attr: TokenStream, item: TokenStream) -> TokenStream {
    value_object::expand(attr, item)
}
