//! 聚合根（AggregateRoot）
//!
//! 以两种模式构建事件溯源聚合：
//! - 新建模式：`new` + `raise_event`，事件立即应用并进入未提交列表，读者在持久化前即可看到变化；
//! - 重放模式：`restore_from_history`，按聚合版本升序应用历史事件，不进入未提交列表。
//!
//! 两种模式结束后都只校验一次不变量。校验失败时通过 `Rejected` 同时返回错误
//! 与部分构建的聚合根，这是有意保留的 API 约定：部分调用方需要记录部分状态。
//!
use crate::{
    aggregate::Aggregate,
    domain_event::DomainEvent,
    entity::Entity,
    error::{AggregateRef, DomainError, DomainResult, Rejected},
};
use std::ops::Deref;

/// 聚合根：聚合状态 + 尚未持久化的事件
#[derive(Debug, Clone)]
pub struct AggregateRoot<A>
where
    A: Aggregate,
{
    aggregate: A,
    uncommitted: Vec<A::Event>,
}

impl<A> AggregateRoot<A>
where
    A: Aggregate,
{
    /// 创建版本为 0 的空聚合根
    pub fn new(id: A::Id) -> Self {
        Self {
            aggregate: <A as Entity>::new(id),
            uncommitted: Vec::new(),
        }
    }

    /// 引发新事件：校验聚合版本连续后立即应用，并加入未提交列表
    pub fn raise_event(&mut self, event: A::Event) -> DomainResult<()> {
        let expected = self.aggregate.version().next();
        if event.aggregate_version() != expected {
            return Err(DomainError::conflict(format!(
                "event {} carries aggregate version {}, expected {}",
                event.event_type(),
                event.aggregate_version(),
                expected
            ))
            .with_aggregate(self.aggregate_ref()));
        }

        self.aggregate.apply(&event);
        self.aggregate.set_version(expected);
        self.uncommitted.push(event);
        Ok(())
    }

    /// 从事件历史重建聚合：按聚合版本升序重放，版本必须从 1 开始且连续
    pub fn restore_from_history<I>(id: A::Id, history: I) -> Result<Self, Rejected<Self>>
    where
        I: IntoIterator<Item = A::Event>,
    {
        let mut root = Self::new(id);
        let mut events: Vec<A::Event> = history.into_iter().collect();
        events.sort_by_key(|e| e.aggregate_version());

        for event in &events {
            let version = event.aggregate_version();
            if !version.follows(root.aggregate.version()) {
                let error = DomainError::validation(format!(
                    "event history is not contiguous: found {} after {}",
                    version,
                    root.aggregate.version()
                ))
                .with_aggregate(root.aggregate_ref());
                return Err(Rejected::new(root, error));
            }
            root.aggregate.apply(event);
            root.aggregate.set_version(version);
        }

        root.validated()
    }

    /// 校验不变量；失败时返回携带部分状态的 `Rejected`
    pub fn validated(self) -> Result<Self, Rejected<Self>> {
        match self.aggregate.validate() {
            Ok(()) => Ok(self),
            Err(error) => {
                let error = error.with_aggregate(self.aggregate_ref());
                Err(Rejected::new(self, error))
            }
        }
    }

    pub fn aggregate(&self) -> &A {
        &self.aggregate
    }

    pub fn into_inner(self) -> A {
        self.aggregate
    }

    pub fn uncommitted_events(&self) -> &[A::Event] {
        &self.uncommitted
    }

    pub fn has_uncommitted_events(&self) -> bool {
        !self.uncommitted.is_empty()
    }

    /// 事件已成功写入日志后调用
    pub fn mark_committed(&mut self) {
        self.uncommitted.clear();
    }

    pub fn aggregate_ref(&self) -> AggregateRef {
        AggregateRef::new(self.aggregate.id().to_string(), A::TYPE)
            .with_version(self.aggregate.version())
    }
}

impl<A> Deref for AggregateRoot<A>
where
    A: Aggregate,
{
    type Target = A;

    fn deref(&self) -> &Self::Target {
        &self.aggregate
    }
}
