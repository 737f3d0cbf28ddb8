//! 事件日志（Event Log）
//!
//! 只追加、按主题排序的领域事件存储：
//! - `Subject`/`SubjectFilter`：层级主题与通配过滤；
//! - `EventRecord`：持久化事件；
//! - `Journal`：存储后端协议，`MemoryJournal` 为内存实现；
//! - `EventStream`：追加/拉取/订阅协议，`JournalEventStream` 在任意 `Journal` 上实现它。
//!
mod journal;
mod journal_stream;
mod memory_journal;
mod record;
mod retry;
mod stream;
mod subject;

pub use journal::{Expectation, Journal, JournalError, ReadBatch};
pub use journal_stream::JournalEventStream;
pub use memory_journal::MemoryJournal;
pub use record::EventRecord;
pub use retry::RetryPolicy;
pub use stream::{AppendResult, EventBatchStream, EventStream};
pub use subject::{Subject, SubjectFilter};
