//! 聚合（Aggregate）抽象
//!
//! 聚合的状态只能由有序的事件历史推导：
//! - `apply` 将单个事件投影到状态（按事件枚举变体分派，不做运行时类型断言）；
//! - `validate` 在构建完成（新建或重放）后校验不变量；
//! - 标识与版本由 `Entity` 约束，版本推进由 `AggregateRoot` 负责。
//!
use crate::domain_event::DomainEvent;
use crate::entity::Entity;
use crate::error::DomainResult;
use std::fmt;

/// 聚合根接口
pub trait Aggregate: Entity + Default + fmt::Debug {
    /// 聚合类型名，用于事件元数据与错误上下文
    const TYPE: &'static str;

    /// 该聚合产生的领域事件类型
    type Event: DomainEvent;

    /// 应用事件，更新聚合状态（不得产生副作用，不得失败）
    fn apply(&mut self, event: &Self::Event);

    /// 校验聚合不变量
    fn validate(&self) -> DomainResult<()>;
}
