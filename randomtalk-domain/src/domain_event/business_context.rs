use bon::Builder;
use serde::{Deserialize, Serialize};

/// 业务上下文：随事件一起持久化的链路与审计信息
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessContext {
    /// 关联ID，同一次用户请求产生的事件共享
    #[builder(into)]
    correlation_id: Option<String>,
    /// 因果ID，触发本次操作的上游消息或事件
    #[builder(into)]
    causation_id: Option<String>,
    /// 触发事件的主体ID（匹配场景下为发起请求的用户）
    #[builder(into)]
    actor_id: Option<String>,
}

impl BusinessContext {
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    /// 派生一个以 `cause` 为因果来源的子上下文，保留关联ID与主体
    pub fn caused_by(&self, cause: impl Into<String>) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            causation_id: Some(cause.into()),
            actor_id: self.actor_id.clone(),
        }
    }
}
