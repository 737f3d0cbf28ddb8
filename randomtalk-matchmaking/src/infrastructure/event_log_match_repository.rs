//! 基于事件日志的匹配仓储
//!
//! 主题布局：`randomtalk.matchmaking.matches.{match_id}.match_created`。
//! 按用户查找最近一次匹配时扫描全部 `match_created` 事件，取最后追加的一条。
//!
use crate::domain::match_aggregate::{
    EVENT_SOURCE_NAME, MATCH_CREATED, MATCH_STREAM_SUFFIX, Match, MatchEvent, MatchId,
};
use crate::domain::match_repository::MatchRepository;
use crate::domain::user::UserId;
use async_trait::async_trait;
use randomtalk_domain::aggregate_root::AggregateRoot;
use randomtalk_domain::domain_event::BusinessContext;
use randomtalk_domain::entity::Entity;
use randomtalk_domain::error::{DomainError, DomainResult, ErrorKind};
use randomtalk_domain::event_log::{EventStream, JournalEventStream, MemoryJournal};
use randomtalk_domain::persist::{AggregateRepository, EventCodec, EventSourcedRepository};
use std::sync::Arc;

pub const MATCH_SCHEMA_BASE: &str = "schemas.randomtalk.com/matchmaking";

/// `Match` 事件与日志记录之间的编解码器
pub fn match_codec() -> EventCodec {
    EventCodec::builder()
        .source(EVENT_SOURCE_NAME)
        .suffix(MATCH_STREAM_SUFFIX)
        .schema_base(MATCH_SCHEMA_BASE)
        .build()
}

pub struct EventLogMatchRepository<S = JournalEventStream<MemoryJournal>> {
    inner: EventSourcedRepository<Match, S>,
}

impl EventLogMatchRepository {
    /// 以独立的内存日志构建，主要用于测试与本地运行
    pub fn in_memory() -> Self {
        let journal = Arc::new(MemoryJournal::new("randomtalk_matchmaking"));
        Self::new(JournalEventStream::new(journal))
    }
}

impl<S> EventLogMatchRepository<S>
where
    S: EventStream,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: EventSourcedRepository::new(stream, match_codec()),
        }
    }

    pub fn stream(&self) -> &S {
        self.inner.stream()
    }

    /// 全部匹配，按创建事件的追加顺序
    pub async fn find_all(&self) -> DomainResult<Vec<Match>> {
        let roots = self.inner.load_all_of_type(MATCH_CREATED).await?;
        Ok(roots.into_iter().map(AggregateRoot::into_inner).collect())
    }
}

#[async_trait]
impl<S> MatchRepository for EventLogMatchRepository<S>
where
    S: EventStream,
{
    async fn save(
        &self,
        root: &mut AggregateRoot<Match>,
        context: &BusinessContext,
    ) -> DomainResult<()> {
        match self.inner.save(root, context).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::Conflict => {
                tracing::debug!(match_id = %root.id(), error = %err, "match already exists");
                Err(DomainError::conflict("match already exists").with_aggregate(root.aggregate_ref()))
            }
            Err(err) => Err(err),
        }
    }

    async fn find_by_id(&self, id: &MatchId) -> DomainResult<Match> {
        self.inner.load(id).await.map(AggregateRoot::into_inner)
    }

    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    async fn find_last_by_user_id(&self, user_id: &UserId) -> DomainResult<Match> {
        let not_found = || DomainError::not_found(format!("no match found for user {user_id}"));

        let filter = self.inner.codec().event_type_filter(MATCH_CREATED)?;
        let records = match self.inner.stream().pull(0, &filter).await {
            Ok(records) => records,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(err) => return Err(err),
        };

        for record in records.iter().rev() {
            let envelope = self.inner.codec().decode::<Match>(record)?;
            let MatchEvent::Created {
                match_id,
                requester,
                candidate,
                ..
            } = envelope.payload;
            if requester.id == *user_id || candidate.id == *user_id {
                return self.find_by_id(&match_id).await;
            }
        }
        Err(not_found())
    }

    async fn exists(&self, id: &MatchId) -> DomainResult<bool> {
        self.inner.exists(id).await
    }
}
