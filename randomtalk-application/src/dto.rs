use serde::Serialize;

/// 数据传输对象（DTO）
///
/// 应用层对外输出的只读结构，与领域模型解耦，可直接序列化给传输层。
pub trait Dto: Serialize + Send + Sync + 'static {}
