//! 持久化与事件溯源（persist）
//!
//! - `EventCodec`：聚合事件与事件日志记录之间的编解码；
//! - `AggregateRepository`：聚合仓储协议；
//! - `EventSourcedRepository`：建立在任意 `EventStream` 之上的通用实现。
//!
//! 具体存储后端由 `event_log::Journal` 的实现决定，本模块只负责装配。
//!
mod aggregate_repository;
mod codec;

pub use aggregate_repository::{AggregateRepository, EventSourcedRepository};
pub use codec::EventCodec;
