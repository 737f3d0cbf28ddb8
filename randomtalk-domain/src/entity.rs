//! 实体（Entity）基础抽象
//!
//! 为聚合与实体提供统一的标识（Id）与版本能力。
//! 版本由 `AggregateRoot` 在应用事件后推进，实体自身不负责递增。
//!
use crate::value_object::Version;
use std::{fmt::Display, str::FromStr};

/// 具备唯一标识与版本的实体抽象，通常由 `#[entity]` 宏生成实现
pub trait Entity: Send + Sync {
    /// 实体标识类型，要求可解析、可显示与可克隆
    type Id: FromStr + Clone + Display + Send + Sync;

    /// 使用给定标识创建版本为 0 的空实体
    fn new(id: Self::Id) -> Self;

    fn id(&self) -> &Self::Id;

    /// 最近一次应用的事件所携带的聚合版本
    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);
}
