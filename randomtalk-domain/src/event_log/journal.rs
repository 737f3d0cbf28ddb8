//! 日志后端协议（Journal）
//!
//! `Journal` 是事件日志下层的存储抽象：全局单调递增的序号、按消息 ID 去重、
//! 以及"某个过滤范围内最后序号必须等于期望值"的条件写入。
//! `JournalEventStream` 在其上实现追加/拉取/订阅协议；接入新的存储后端只需实现本 trait。
//!
use super::record::EventRecord;
use super::subject::SubjectFilter;
use crate::error::DomainError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 后端错误，在流协议边界处转换为 `DomainError`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JournalError {
    #[error("duplicate message id {msg_id}")]
    Duplicate { msg_id: String },
    #[error("wrong last sequence for {filter}: expected {expected}, actual {actual}")]
    WrongLastSequence {
        filter: String,
        expected: u64,
        actual: u64,
    },
    #[error("journal unavailable: {0}")]
    Unavailable(String),
}

impl JournalError {
    /// 只有后端不可达属于瞬时故障
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<JournalError> for DomainError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::Duplicate { .. } | JournalError::WrongLastSequence { .. } => {
                DomainError::conflict(err.to_string())
            }
            JournalError::Unavailable(_) => DomainError::transient_io(err.to_string()),
        }
    }
}

/// 条件写入参数
#[derive(Debug, Clone)]
pub struct Expectation {
    /// 去重键，通常为事件 ID
    pub msg_id: String,
    /// 要求 `filter` 范围内的最后序号等于给定值（0 表示范围内尚无消息）
    pub last_sequence: Option<(SubjectFilter, u64)>,
}

/// 一次读取的结果
#[derive(Debug, Clone, Default)]
pub struct ReadBatch {
    pub records: Vec<EventRecord>,
    /// 本次扫描覆盖到的最大全局序号；下一次读取应从它之后开始
    pub scanned_to: u64,
}

#[async_trait]
pub trait Journal: Send + Sync {
    /// 日志（流）名称
    fn name(&self) -> &str;

    /// 条件追加一条记录，返回分配的全局序号
    async fn publish(
        &self,
        record: EventRecord,
        expectation: Expectation,
    ) -> Result<u64, JournalError>;

    /// 过滤范围内最后一条记录的序号，没有记录时为 0
    async fn last_sequence(&self, filter: &SubjectFilter) -> Result<u64, JournalError>;

    /// 过滤范围内最后一条记录
    async fn last(&self, filter: &SubjectFilter) -> Result<Option<EventRecord>, JournalError>;

    /// 从全局序号 `from`（含）开始，读取最多 `limit` 条匹配记录
    async fn read(
        &self,
        filter: &SubjectFilter,
        from: u64,
        limit: usize,
    ) -> Result<ReadBatch, JournalError>;

    /// 过滤范围内的记录总数
    async fn count(&self, filter: &SubjectFilter) -> Result<u64, JournalError>;

    /// 等待全局序号超过 `after`，最长等待 `max_wait`；返回是否出现了新记录
    async fn wait_beyond(&self, after: u64, max_wait: Duration) -> Result<bool, JournalError>;
}
