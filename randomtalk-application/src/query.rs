use crate::dto::Dto;

/// 应用层查询（Query）
///
/// 只读意图，不改变领域状态，结果以 [`Dto`](crate::dto::Dto) 返回。
/// 读路径可以直连事件日志重放，也可以改为读取投影。
pub trait Query: Send + Sync + 'static {
    /// 查询的稳定名称
    const NAME: &'static str;

    type Dto: Dto;
}
