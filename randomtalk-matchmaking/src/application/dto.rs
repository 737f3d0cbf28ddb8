use crate::domain::match_aggregate::Match;
use crate::domain::processor::MatchOutcome;
use crate::domain::user::UserSnapshot;
use chrono::{DateTime, Utc};
use randomtalk_application::dto::Dto;
use randomtalk_domain::entity::Entity;
use serde::Serialize;

/// 匹配的只读视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchDto {
    pub match_id: String,
    pub version: u64,
    pub requester: Option<UserSnapshot>,
    pub candidate: Option<UserSnapshot>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Dto for MatchDto {}

impl From<&Match> for MatchDto {
    fn from(matched: &Match) -> Self {
        Self {
            match_id: matched.id().to_string(),
            version: matched.version().value(),
            requester: matched.requester().cloned(),
            candidate: matched.candidate().cloned(),
            created_at: matched.created_at(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Matched,
    Waiting,
}

/// `MatchUserWithPreferences` 的执行结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRequestOutcome {
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
}

impl Dto for MatchRequestOutcome {}

impl From<MatchOutcome> for MatchRequestOutcome {
    fn from(outcome: MatchOutcome) -> Self {
        match outcome {
            MatchOutcome::Matched {
                match_id,
                partner_id,
            } => Self {
                status: RequestStatus::Matched,
                match_id: Some(match_id.to_string()),
                partner_id: Some(partner_id.to_string()),
            },
            MatchOutcome::Waiting => Self {
                status: RequestStatus::Waiting,
                match_id: None,
                partner_id: None,
            },
        }
    }
}
