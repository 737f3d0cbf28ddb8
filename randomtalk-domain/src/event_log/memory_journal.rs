//! 内存版日志后端（MemoryJournal）
//!
//! 单进程内满足 `Journal` 协议的实现：条件写入在同一把写锁内完成校验与追加，
//! 因此同一聚合的并发追加会被串行化，失败方收到 `WrongLastSequence`。
//! 典型用途：测试、本地开发与单实例部署。
//!
use super::journal::{Expectation, Journal, JournalError, ReadBatch};
use super::record::EventRecord;
use super::subject::SubjectFilter;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct State {
    records: Vec<EventRecord>,
    msg_ids: HashSet<String>,
}

impl State {
    fn head(&self) -> u64 {
        self.records.len() as u64
    }

    fn last_position(&self, filter: &SubjectFilter) -> Option<usize> {
        self.records
            .iter()
            .rposition(|r| filter.matches(r.subject()))
    }
}

pub struct MemoryJournal {
    name: String,
    state: RwLock<State>,
    appended: Notify,
}

impl MemoryJournal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(State::default()),
            appended: Notify::new(),
        }
    }

    /// 当前全局序号（即记录总数）
    pub fn head(&self) -> u64 {
        self.state.read().head()
    }
}

#[async_trait]
impl Journal for MemoryJournal {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(
        &self,
        record: EventRecord,
        expectation: Expectation,
    ) -> Result<u64, JournalError> {
        let sequence = {
            let mut state = self.state.write();

            if state.msg_ids.contains(&expectation.msg_id) {
                return Err(JournalError::Duplicate {
                    msg_id: expectation.msg_id,
                });
            }

            if let Some((filter, expected)) = &expectation.last_sequence {
                let actual = state
                    .last_position(filter)
                    .map(|i| i as u64 + 1)
                    .unwrap_or(0);
                if actual != *expected {
                    return Err(JournalError::WrongLastSequence {
                        filter: filter.to_string(),
                        expected: *expected,
                        actual,
                    });
                }
            }

            let sequence = state.head() + 1;
            state.records.push(record.with_sequence(sequence));
            state.msg_ids.insert(expectation.msg_id);
            sequence
        };

        self.appended.notify_waiters();
        Ok(sequence)
    }

    async fn last_sequence(&self, filter: &SubjectFilter) -> Result<u64, JournalError> {
        let state = self.state.read();
        Ok(state.last_position(filter).map(|i| i as u64 + 1).unwrap_or(0))
    }

    async fn last(&self, filter: &SubjectFilter) -> Result<Option<EventRecord>, JournalError> {
        let state = self.state.read();
        Ok(state.last_position(filter).map(|i| state.records[i].clone()))
    }

    async fn read(
        &self,
        filter: &SubjectFilter,
        from: u64,
        limit: usize,
    ) -> Result<ReadBatch, JournalError> {
        let state = self.state.read();
        let start = from.max(1) as usize - 1;
        let mut batch = ReadBatch {
            records: Vec::new(),
            scanned_to: state.head().max(from.saturating_sub(1)),
        };
        if limit == 0 {
            batch.scanned_to = from.saturating_sub(1);
            return Ok(batch);
        }

        for (offset, record) in state.records.iter().enumerate().skip(start) {
            if !filter.matches(record.subject()) {
                continue;
            }
            batch.records.push(record.clone());
            if batch.records.len() == limit {
                batch.scanned_to = offset as u64 + 1;
                break;
            }
        }
        Ok(batch)
    }

    async fn count(&self, filter: &SubjectFilter) -> Result<u64, JournalError> {
        let state = self.state.read();
        Ok(state
            .records
            .iter()
            .filter(|r| filter.matches(r.subject()))
            .count() as u64)
    }

    async fn wait_beyond(&self, after: u64, max_wait: Duration) -> Result<bool, JournalError> {
        let notified = self.appended.notified();
        tokio::pin!(notified);
        // 先登记再检查，避免检查与等待之间的追加被漏掉
        notified.as_mut().enable();

        if self.head() > after {
            return Ok(true);
        }

        match tokio::time::timeout(max_wait, notified).await {
            Ok(()) => Ok(self.head() > after),
            Err(_elapsed) => Ok(false),
        }
    }
}
