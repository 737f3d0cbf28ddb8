//! 基于 `Journal` 的事件流实现（JournalEventStream）
//!
//! 追加协议：
//! 1. 读取首个事件所属聚合范围（`{source}.{suffix}.{id}.>`）的最后序号与最后版本；
//! 2. 首个事件的聚合版本必须恰好是最后版本 + 1，否则为冲突；
//! 3. 逐条写入，每条以事件 ID 作为去重键，并要求该范围的最后序号等于上一次写入的结果；
//! 4. 瞬时故障按 `RetryPolicy` 重试，重复键与序号不符直接作为冲突返回。
//!
//! 并发控制只作用于单个聚合的范围，两个不同聚合的追加永不竞争。
//!
use super::journal::{Expectation, Journal, JournalError};
use super::record::EventRecord;
use super::retry::RetryPolicy;
use super::stream::{AppendResult, EventBatchStream, EventStream};
use super::subject::SubjectFilter;
use crate::error::{DomainError, DomainResult as Result};
use crate::value_object::Version;
use async_trait::async_trait;
use bon::Builder;
use futures_util::stream;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Builder)]
pub struct JournalEventStream<J>
where
    J: Journal + 'static,
{
    journal: Arc<J>,
    #[builder(default)]
    retry: RetryPolicy,
    /// `fetch` 在没有新数据时的最长等待，超时产生空批次
    #[builder(default = Duration::from_secs(10))]
    fetch_max_wait: Duration,
}

impl<J> JournalEventStream<J>
where
    J: Journal + 'static,
{
    pub fn new(journal: Arc<J>) -> Self {
        Self::builder().journal(journal).build()
    }

    pub fn journal(&self) -> &Arc<J> {
        &self.journal
    }

    async fn last_version(&self, range: &SubjectFilter) -> Result<Version> {
        let last = self
            .retry
            .run("last", || self.journal.last(range))
            .await?;
        Ok(last.map(|r| r.aggregate_version()).unwrap_or_default())
    }
}

#[async_trait]
impl<J> EventStream for JournalEventStream<J>
where
    J: Journal + 'static,
{
    fn name(&self) -> &str {
        self.journal.name()
    }

    #[tracing::instrument(skip_all, fields(stream = %self.journal.name(), events = events.len()))]
    async fn append(&self, events: Vec<EventRecord>) -> Result<AppendResult> {
        let first = events
            .first()
            .ok_or_else(|| DomainError::validation("no events to append"))?;
        let range = first.subject().aggregate_range();

        let mut expected = self
            .retry
            .run("last_sequence", || self.journal.last_sequence(&range))
            .await?;
        let last_version = self.last_version(&range).await?;
        if !first.aggregate_version().follows(last_version) {
            return Err(DomainError::conflict(format!(
                "{} carries aggregate version {}, but {} is at {}",
                first.id(),
                first.aggregate_version(),
                range,
                last_version
            )));
        }

        let num_events = events.len();
        let mut last_event_id = String::new();
        for record in events {
            let in_range = range.matches(record.subject());
            let expectation = Expectation {
                msg_id: record.id().to_string(),
                last_sequence: in_range.then(|| (range.clone(), expected)),
            };
            last_event_id = record.id().to_string();

            let sequence = self
                .retry
                .run("publish", || {
                    self.journal.publish(record.clone(), expectation.clone())
                })
                .await
                .map_err(|err| {
                    if !err.is_transient() {
                        tracing::debug!(event_id = %last_event_id, error = %err, "append rejected");
                    }
                    DomainError::from(err)
                })?;
            if in_range {
                expected = sequence;
            }
        }

        tracing::debug!(last_sequence = expected, "events appended");
        Ok(AppendResult {
            stream_name: self.journal.name().to_string(),
            last_sequence: expected,
            last_event_id,
            num_events,
        })
    }

    async fn pull(&self, batch_size: i64, filter: &SubjectFilter) -> Result<Vec<EventRecord>> {
        let limit = if batch_size <= 0 {
            self.journal.count(filter).await?
        } else {
            batch_size as u64
        };
        if limit == 0 {
            return Err(DomainError::not_found(format!("no events found for {filter}")));
        }

        let batch = self.journal.read(filter, 1, limit as usize).await?;
        if batch.records.is_empty() {
            return Err(DomainError::not_found(format!("no events found for {filter}")));
        }
        Ok(batch.records)
    }

    fn fetch(
        &self,
        batch_size: usize,
        filter: SubjectFilter,
        cancel: CancellationToken,
    ) -> EventBatchStream {
        let cursor = FetchCursor {
            journal: self.journal.clone(),
            filter,
            batch_size: batch_size.max(1),
            max_wait: self.fetch_max_wait,
            backoff: self.retry.wait,
            cancel,
            next: 1,
            failed: false,
        };
        Box::pin(stream::unfold(cursor, FetchCursor::advance))
    }

    async fn fetch_last(&self, filter: &SubjectFilter) -> Result<EventRecord> {
        self.journal
            .last(filter)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("no event found for {filter}")))
    }
}

/// `fetch` 的游标状态；每次推进最多产生一个批次
struct FetchCursor<J: Journal> {
    journal: Arc<J>,
    filter: SubjectFilter,
    batch_size: usize,
    max_wait: Duration,
    backoff: Duration,
    cancel: CancellationToken,
    next: u64,
    failed: bool,
}

impl<J: Journal> FetchCursor<J> {
    async fn advance(mut self) -> Option<(Result<Vec<EventRecord>>, Self)> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            if self.failed {
                tokio::select! {
                    _ = self.cancel.cancelled() => return None,
                    _ = tokio::time::sleep(self.backoff) => self.failed = false,
                }
            }

            let batch = match self
                .journal
                .read(&self.filter, self.next, self.batch_size)
                .await
            {
                Ok(batch) => batch,
                Err(err) => return Some((Err(self.fail(err)), self)),
            };
            self.next = batch.scanned_to + 1;
            if !batch.records.is_empty() {
                return Some((Ok(batch.records), self));
            }

            let woke = tokio::select! {
                _ = self.cancel.cancelled() => return None,
                woke = self.journal.wait_beyond(batch.scanned_to, self.max_wait) => woke,
            };
            match woke {
                // 有新记录，但不一定匹配过滤器，继续读取
                Ok(true) => continue,
                Ok(false) => return Some((Ok(Vec::new()), self)),
                Err(err) => return Some((Err(self.fail(err)), self)),
            }
        }
    }

    fn fail(&mut self, err: JournalError) -> DomainError {
        tracing::warn!(filter = %self.filter, error = %err, "fetch failed");
        self.failed = true;
        err.into()
    }
}
