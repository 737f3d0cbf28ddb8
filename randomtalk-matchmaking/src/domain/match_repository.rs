use super::match_aggregate::{Match, MatchId};
use super::user::UserId;
use async_trait::async_trait;
use randomtalk_domain::aggregate_root::AggregateRoot;
use randomtalk_domain::domain_event::BusinessContext;
use randomtalk_domain::error::DomainResult;

/// 匹配仓储
///
/// 后端的“已写入”信号必须映射为 `Conflict`，未找到映射为 `NotFound`。
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// 持久化未提交事件；成功后聚合根不再有未提交事件
    async fn save(&self, root: &mut AggregateRoot<Match>, context: &BusinessContext)
    -> DomainResult<()>;

    async fn find_by_id(&self, id: &MatchId) -> DomainResult<Match>;

    /// 最近一次涉及该用户的匹配
    async fn find_last_by_user_id(&self, user_id: &UserId) -> DomainResult<Match>;

    async fn exists(&self, id: &MatchId) -> DomainResult<bool>;
}
