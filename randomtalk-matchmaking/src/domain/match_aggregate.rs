//! 匹配聚合（Match）
//!
//! 一次成功配对；由唯一的 `match_created` 事件创建，此后不再变化。
//! 事件携带双方在配对时刻的快照与创建时间，因此重放得到的状态与新建时完全一致。
//!
use super::user::{UserId, UserSnapshot};
use chrono::{DateTime, Utc};
use randomtalk_domain::aggregate::Aggregate;
use randomtalk_domain::aggregate_root::AggregateRoot;
use randomtalk_domain::entity::Entity;
use randomtalk_domain::error::{DomainError, DomainResult, Rejected};
use randomtalk_macros::{domain_event, entity, entity_id};
use uuid::Uuid;

/// 匹配上下文的事件来源
pub const EVENT_SOURCE_NAME: &str = "randomtalk.matchmaking";
/// 匹配聚合所在的流后缀
pub const MATCH_STREAM_SUFFIX: &str = "matches";
pub const MATCH_CREATED: &str = "match_created";

#[entity_id]
pub struct MatchId(String);

impl MatchId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[entity(id = MatchId)]
pub struct Match {
    requester: Option<UserSnapshot>,
    candidate: Option<UserSnapshot>,
    created_at: Option<DateTime<Utc>>,
}

#[domain_event(version = 1)]
pub enum MatchEvent {
    #[event(event_type = "match_created")]
    Created {
        match_id: MatchId,
        requester: UserSnapshot,
        candidate: UserSnapshot,
        created_at: DateTime<Utc>,
    },
}

impl Aggregate for Match {
    const TYPE: &'static str = "match";
    type Event = MatchEvent;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            MatchEvent::Created {
                requester,
                candidate,
                created_at,
                ..
            } => {
                self.requester = Some(requester.clone());
                self.candidate = Some(candidate.clone());
                self.created_at = Some(*created_at);
            }
        }
    }

    fn validate(&self) -> DomainResult<()> {
        if self.id.0.is_empty() {
            return Err(DomainError::validation("match ID not provided"));
        }
        let Some(requester) = &self.requester else {
            return Err(DomainError::validation("match requester not provided"));
        };
        let Some(candidate) = &self.candidate else {
            return Err(DomainError::validation("match candidate not provided"));
        };
        if requester.id == candidate.id {
            return Err(DomainError::validation("user cannot match with itself"));
        }
        Ok(())
    }
}

impl Match {
    /// 新建模式：引发 `match_created` 并校验
    ///
    /// 校验失败时 `Rejected` 仍携带已应用事件的聚合根。
    pub fn create(
        id: MatchId,
        requester: UserSnapshot,
        candidate: UserSnapshot,
    ) -> Result<AggregateRoot<Match>, Rejected<AggregateRoot<Match>>> {
        let mut root = AggregateRoot::<Match>::new(id.clone());
        let event = MatchEvent::Created {
            id: Uuid::new_v4().to_string(),
            aggregate_version: root.version().next(),
            match_id: id,
            requester,
            candidate,
            created_at: Utc::now(),
        };
        if let Err(error) = root.raise_event(event) {
            return Err(Rejected::new(root, error));
        }
        root.validated()
    }

    /// 重放模式
    pub fn from_events<I>(
        id: MatchId,
        events: I,
    ) -> Result<AggregateRoot<Match>, Rejected<AggregateRoot<Match>>>
    where
        I: IntoIterator<Item = MatchEvent>,
    {
        AggregateRoot::restore_from_history(id, events)
    }

    pub fn requester(&self) -> Option<&UserSnapshot> {
        self.requester.as_ref()
    }

    pub fn candidate(&self) -> Option<&UserSnapshot> {
        self.candidate.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// 发起方在前
    pub fn participant_ids(&self) -> Vec<&UserId> {
        self.requester
            .iter()
            .chain(self.candidate.iter())
            .map(|u| &u.id)
            .collect()
    }

    pub fn involves(&self, user_id: &UserId) -> bool {
        self.participant_ids().contains(&user_id)
    }
}
