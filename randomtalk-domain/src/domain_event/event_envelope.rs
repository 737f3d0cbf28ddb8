use crate::aggregate::Aggregate;

use super::business_context::BusinessContext;
use super::metadata::Metadata;

/// 事件信封，包含事件载荷、元数据与业务上下文
#[derive(Debug, Clone)]
pub struct EventEnvelope<A>
where
    A: Aggregate,
{
    pub metadata: Metadata,
    pub payload: A::Event,
    pub context: BusinessContext,
}

impl<A> EventEnvelope<A>
where
    A: Aggregate,
{
    /// 为尚未持久化的事件创建信封，发生时间取当前时刻
    pub fn new(aggregate_id: &A::Id, payload: A::Event, context: BusinessContext) -> Self {
        let metadata = Metadata::builder()
            .aggregate_id(aggregate_id.to_string())
            .aggregate_type(A::TYPE)
            .build();

        Self {
            metadata,
            payload,
            context,
        }
    }
}
