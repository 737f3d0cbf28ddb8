use crate::value_object::Version;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// 领域事件载荷需要满足的通用能力边界
///
/// 事件以枚举表达，`apply` 通过 `match` 分派到各变体；
/// `EVENT_TYPES` 列出该枚举能产生的全部事件类型名，解码时据此拒绝未知类型。
pub trait DomainEvent:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync
{
    const EVENT_TYPES: &'static [&'static str];

    /// 事件唯一标识，同时作为事件日志的去重键
    fn event_id(&self) -> &str;

    /// 事件类型（如 `match_created`）
    fn event_type(&self) -> &'static str;

    /// 事件载荷的 schema 版本
    fn event_version(&self) -> usize;

    /// 事件对应的聚合版本
    fn aggregate_version(&self) -> Version;
}
