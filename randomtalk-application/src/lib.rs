//! 应用层（randomtalk-application）
//!
//! CQRS 管道：命令/查询协议、处理器与进程内总线。总线是显式构建的注册表对象，
//! 在启动时装配一次后按引用传入各组件，而不是进程级单例。
//!
pub mod command;
pub mod command_bus;
pub mod command_handler;
pub mod context;
pub mod dto;
pub mod error;
pub mod inmemory_command_bus;
pub mod inmemory_query_bus;
pub mod query;
pub mod query_bus;
pub mod query_handler;

pub use inmemory_command_bus::InMemoryCommandBus;
pub use inmemory_query_bus::InMemoryQueryBus;
