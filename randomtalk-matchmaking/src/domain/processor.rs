//! 匹配处理器
//!
//! 单次请求的流程：读取等待池快照 → 稳定匹配 → 移出被选中者 → 创建并持久化 `Match`
//! → 通知双方；没有可配对对象时把请求者放入等待池。
//!
//! “读取快照、挑选、移出”三步不是一个原子事务：两个并发请求可能读到同一快照并选中同一人。
//! 池的 `remove_users` 是全有或全无的，较慢的一方会得到 `NotFound` 并整体失败，
//! 由外层消费者决定是否重投。已完成的副作用（如移出等待池）在后续失败或取消时不做补偿。
//!
use super::match_aggregate::{Match, MatchId};
use super::match_repository::MatchRepository;
use super::matcher::StableMatchFinder;
use super::notifications::NotificationsChannel;
use super::user::{User, UserId};
use super::user_store::UserStore;
use async_trait::async_trait;
use bon::Builder;
use randomtalk_domain::aggregate_root::AggregateRoot;
use randomtalk_domain::domain_event::BusinessContext;
use randomtalk_domain::entity::Entity;
use randomtalk_domain::error::{DomainError, DomainResult, ErrorKind};
use std::slice;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 单次请求的终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched { match_id: MatchId, partner_id: UserId },
    Waiting,
}

#[async_trait]
pub trait MatchmakingProcessor: Send + Sync {
    /// 立即尝试配对，否则入池等待
    async fn process_match_request(
        &self,
        user: User,
        context: &BusinessContext,
        cancel: &CancellationToken,
    ) -> DomainResult<MatchOutcome>;
}

#[derive(Builder)]
pub struct UserMatchProcessor {
    match_repository: Arc<dyn MatchRepository>,
    user_store: Arc<dyn UserStore>,
    matcher: Arc<dyn StableMatchFinder>,
    notifications: Arc<dyn NotificationsChannel>,
}

#[async_trait]
impl MatchmakingProcessor for UserMatchProcessor {
    #[tracing::instrument(
        skip_all,
        fields(component = "matchmaking.processor", user_id = %user.id())
    )]
    async fn process_match_request(
        &self,
        user: User,
        context: &BusinessContext,
        cancel: &CancellationToken,
    ) -> DomainResult<MatchOutcome> {
        tracing::debug!("processing match user request");

        match self.attempt_match(&user, context, cancel).await {
            Err(err) if err.kind() == ErrorKind::NoCandidates => {
                ensure_active(cancel, "enqueue")?;
                self.user_store.add_user(user).await?;
                tracing::debug!("no compatible users, user added to the waiting pool");
                Ok(MatchOutcome::Waiting)
            }
            Err(err) => {
                tracing::warn!(error = %err, kind = %err.kind(), "match attempt failed");
                Err(err)
            }
            ok => ok,
        }
    }
}

impl UserMatchProcessor {
    async fn attempt_match(
        &self,
        user: &User,
        context: &BusinessContext,
        cancel: &CancellationToken,
    ) -> DomainResult<MatchOutcome> {
        ensure_active(cancel, "read pool")?;
        let pool = self.user_store.get_all().await?;

        let picked = self
            .matcher
            .find_stable_matches(slice::from_ref(user), &pool)
            .and_then(|matches| matches.first().copied().flatten());
        let Some(index) = picked else {
            return Err(DomainError::no_candidates(format!(
                "no compatible user among {} waiting",
                pool.len()
            )));
        };
        let partner = &pool[index];

        ensure_active(cancel, "remove matched user")?;
        self.user_store
            .remove_users(slice::from_ref(partner.id()))
            .await?;

        ensure_active(cancel, "persist match")?;
        let root = self.create_and_persist(user, partner, context).await?;
        tracing::info!(
            match_id = %root.id(),
            user_ids = ?[user.id().to_string(), partner.id().to_string()],
            "new match created"
        );

        ensure_active(cancel, "notify participants")?;
        self.notify_participants(&root).await?;

        Ok(MatchOutcome::Matched {
            match_id: root.id().clone(),
            partner_id: partner.id().clone(),
        })
    }

    async fn create_and_persist(
        &self,
        requester: &User,
        partner: &User,
        context: &BusinessContext,
    ) -> DomainResult<AggregateRoot<Match>> {
        let mut root = Match::create(MatchId::generate(), requester.snapshot(), partner.snapshot())
            .map_err(|rejected| {
                tracing::warn!(partial = ?rejected.partial().aggregate(), "match rejected on creation");
                rejected.into_error()
            })?;
        self.match_repository.save(&mut root, context).await?;
        Ok(root)
    }

    /// 两个参与者都会尝试通知，返回第一个失败
    async fn notify_participants(&self, root: &AggregateRoot<Match>) -> DomainResult<()> {
        let mut first_failure = None;
        for user_id in root.participant_ids() {
            if let Err(err) = self.notifications.notify(user_id, root.aggregate()).await {
                tracing::error!(user_id = %user_id, error = %err, "failed to notify participant");
                first_failure.get_or_insert(err);
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn ensure_active(cancel: &CancellationToken, stage: &'static str) -> DomainResult<()> {
    if cancel.is_cancelled() {
        tracing::debug!(stage, "match request cancelled");
        return Err(DomainError::cancelled(stage));
    }
    Ok(())
}
