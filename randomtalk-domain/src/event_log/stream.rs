//! 事件流（EventStream）协议
//!
//! 面向聚合持久化的追加/拉取/订阅接口：
//! - `append`：带乐观并发检查的批量追加；
//! - `pull`：从过滤范围起点开始的同步有界读取；
//! - `fetch`：惰性、无限、不可重启的批次流，直到调用方取消；
//! - `fetch_last`：过滤范围内最后一条事件。
//!
use super::record::EventRecord;
use super::subject::SubjectFilter;
use crate::error::DomainResult as Result;
use async_trait::async_trait;
use futures_core::stream::BoxStream;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 追加结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendResult {
    pub stream_name: String,
    /// 最后一条事件被分配的全局序号
    pub last_sequence: u64,
    pub last_event_id: String,
    pub num_events: usize,
}

/// 订阅得到的批次流；超时产生空批次，取消后结束
pub type EventBatchStream = BoxStream<'static, Result<Vec<EventRecord>>>;

#[async_trait]
pub trait EventStream: Send + Sync {
    fn name(&self) -> &str;

    /// 按顺序逐条写入一批事件
    ///
    /// 批次不是原子的：中途失败时，失败之前的事件已经持久化，错误照常返回。
    /// 调用方应以重新加载聚合的方式确认实际写入的内容。
    async fn append(&self, events: Vec<EventRecord>) -> Result<AppendResult>;

    /// `batch_size <= 0` 时读取过滤范围内的全部事件
    async fn pull(&self, batch_size: i64, filter: &SubjectFilter) -> Result<Vec<EventRecord>>;

    fn fetch(
        &self,
        batch_size: usize,
        filter: SubjectFilter,
        cancel: CancellationToken,
    ) -> EventBatchStream;

    async fn fetch_last(&self, filter: &SubjectFilter) -> Result<EventRecord>;
}

#[async_trait]
impl<T: EventStream + ?Sized> EventStream for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn append(&self, events: Vec<EventRecord>) -> Result<AppendResult> {
        (**self).append(events).await
    }

    async fn pull(&self, batch_size: i64, filter: &SubjectFilter) -> Result<Vec<EventRecord>> {
        (**self).pull(batch_size, filter).await
    }

    fn fetch(
        &self,
        batch_size: usize,
        filter: SubjectFilter,
        cancel: CancellationToken,
    ) -> EventBatchStream {
        (**self).fetch(batch_size, filter, cancel)
    }

    async fn fetch_last(&self, filter: &SubjectFilter) -> Result<EventRecord> {
        (**self).fetch_last(filter).await
    }
}
