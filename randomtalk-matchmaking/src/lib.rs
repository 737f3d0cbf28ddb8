//! 匹配上下文（randomtalk-matchmaking）
//!
//! 把发起匹配请求的用户与等待池中的用户做稳定匹配：
//! - 领域（`domain`）：性别、位置、偏好等共享值对象，`User`、`Match` 聚合、
//!   Gale-Shapley 匹配器与处理器，以及仓储、等待池、通知三个协作方协议；
//! - 基础设施（`infrastructure`）：基于事件日志的匹配仓储、内存等待池、
//!   广播通知通道与匹配请求消费者；
//! - 应用层（`application`）：`MatchUserWithPreferences` 命令与匹配查询；
//! - `config`/`telemetry`/`service`：配置加载、日志初始化与服务装配。
//!
//! 一次请求：读取等待池 → 稳定匹配 → 移出被选中者 → 持久化 `match_created` → 通知双方；
//! 找不到兼容对象时请求者进入等待池。
//!
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod service;
pub mod telemetry;
