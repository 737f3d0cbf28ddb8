//! 事件溯源领域内核（randomtalk-domain）
//!
//! 提供各限界上下文共用的领域层构件：
//! - 实体（`entity`）、值对象（`value_object`）与聚合（`aggregate`）建模；
//! - 聚合根（`aggregate_root`）：新建模式与重放模式，构建完成后统一校验；
//! - 领域事件（`domain_event`）：事件协议、信封、元数据与业务上下文；
//! - 事件日志（`event_log`）：只追加、按主题过滤、带乐观并发控制的事件流；
//! - 仓储（`persist`）：事件编解码与通用事件溯源仓储；
//! - 错误分类（`error`）：校验、未找到、冲突、无候选、瞬时 I/O 等。
//!
//! 典型用法：
//! 1. 用 `#[entity]` 与 `#[domain_event]` 定义聚合及其事件，实现 `Aggregate::apply/validate`；
//! 2. 通过 `AggregateRoot::raise_event` 产生新事件；
//! 3. 使用 `EventSourcedRepository` 将未提交事件追加到事件日志，或从日志重放聚合。
//!
pub mod aggregate;
pub mod aggregate_root;
pub mod domain_event;
pub mod entity;
pub mod error;
#[cfg(feature = "event-log")]
pub mod event_log;
#[cfg(feature = "event-log")]
pub mod persist;
pub mod value_object;

// 允许在本 crate 内部通过 ::randomtalk_domain 自引用，
// 以便过程宏生成的路径在本 crate 的单元测试中也能解析。
extern crate self as randomtalk_domain;
