use super::match_aggregate::Match;
use super::user::UserId;
use async_trait::async_trait;
use randomtalk_domain::error::DomainResult;

/// 匹配结果的推送通道（至少一次语义，失败不在核心内重试）
#[async_trait]
pub trait NotificationsChannel: Send + Sync {
    async fn notify(&self, user_id: &UserId, matched: &Match) -> DomainResult<()>;
}
