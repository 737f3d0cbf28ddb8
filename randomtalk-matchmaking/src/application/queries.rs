//! 读路径：直接从事件日志重放匹配
use super::dto::MatchDto;
use crate::domain::match_aggregate::MatchId;
use crate::domain::match_repository::MatchRepository;
use crate::domain::user::UserId;
use async_trait::async_trait;
use randomtalk_application::context::AppContext;
use randomtalk_application::error::AppError;
use randomtalk_application::query::Query;
use randomtalk_application::query_handler::QueryHandler;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FindMatchById {
    pub match_id: MatchId,
}

impl Query for FindMatchById {
    const NAME: &'static str = "matchmaking.find_match_by_id";
    type Dto = MatchDto;
}

/// 用户最近一次的匹配
#[derive(Debug, Clone)]
pub struct FindLastMatchByUser {
    pub user_id: UserId,
}

impl Query for FindLastMatchByUser {
    const NAME: &'static str = "matchmaking.find_last_match_by_user";
    type Dto = MatchDto;
}

/// 同时处理两种匹配查询
pub struct MatchQueryHandler {
    matches: Arc<dyn MatchRepository>,
}

impl MatchQueryHandler {
    pub fn new(matches: Arc<dyn MatchRepository>) -> Self {
        Self { matches }
    }
}

#[async_trait]
impl QueryHandler<FindMatchById> for MatchQueryHandler {
    async fn handle(&self, _ctx: &AppContext, q: FindMatchById) -> Result<MatchDto, AppError> {
        let found = self.matches.find_by_id(&q.match_id).await?;
        Ok(MatchDto::from(&found))
    }
}

#[async_trait]
impl QueryHandler<FindLastMatchByUser> for MatchQueryHandler {
    async fn handle(&self, _ctx: &AppContext, q: FindLastMatchByUser) -> Result<MatchDto, AppError> {
        if q.user_id.to_string().trim().is_empty() {
            return Err(AppError::Validation("user id is required".into()));
        }
        let found = self.matches.find_last_by_user_id(&q.user_id).await?;
        Ok(MatchDto::from(&found))
    }
}
