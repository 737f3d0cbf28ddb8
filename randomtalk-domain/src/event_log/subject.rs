//! 主题（Subject）与主题过滤器
//!
//! 主题由点号分隔的 token 组成：`{source}.{suffix}.{aggregate_id}.{event_type}`，
//! 其中 source 本身可以包含多个 token（如 `randomtalk.matchmaking`）。
//! 过滤器支持 `*`（恰好匹配一个 token）与末尾的 `>`（匹配一个或多个 token），
//! 这样"某个聚合的全部事件"就是一个可以独立读取的连续范围。
//!
use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const SINGLE: &str = "*";
const TAIL: &str = ">";

fn check_token(token: &str) -> DomainResult<()> {
    if token.is_empty()
        || token.contains('.')
        || token == SINGLE
        || token == TAIL
        || token.chars().any(char::is_whitespace)
    {
        return Err(DomainError::validation(format!(
            "invalid subject token '{token}'"
        )));
    }
    Ok(())
}

/// 具体主题（不含通配符）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject(String);

impl Subject {
    /// 构建聚合事件主题：`{source}.{suffix}.{aggregate_id}.{event_type}`
    pub fn for_event(
        source: &str,
        suffix: &str,
        aggregate_id: &str,
        event_type: &str,
    ) -> DomainResult<Self> {
        for token in [suffix, aggregate_id, event_type] {
            check_token(token)?;
        }
        Self::parse(format!("{source}.{suffix}.{aggregate_id}.{event_type}"))
    }

    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        for token in raw.split('.') {
            check_token(token)?;
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// 倒数第 `n` 个 token（0 表示最后一个）
    pub fn token_from_end(&self, n: usize) -> Option<&str> {
        self.0.rsplit('.').nth(n)
    }

    /// 聚合标识：事件主题的倒数第二个 token
    pub fn aggregate_id(&self) -> Option<&str> {
        self.token_from_end(1)
    }

    /// 覆盖同一聚合全部事件的过滤器（去掉最后一个 token，追加 `>`）
    pub fn aggregate_range(&self) -> SubjectFilter {
        match self.0.rsplit_once('.') {
            Some((prefix, _)) => SubjectFilter(format!("{prefix}.{TAIL}")),
            None => SubjectFilter(self.0.clone()),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Subject {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Subject> for String {
    fn from(value: Subject) -> Self {
        value.0
    }
}

/// 主题过滤器
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectFilter(String);

impl SubjectFilter {
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let tokens: Vec<&str> = raw.split('.').collect();
        for (i, token) in tokens.iter().enumerate() {
            match *token {
                SINGLE => {}
                TAIL if i + 1 == tokens.len() => {}
                TAIL => {
                    return Err(DomainError::validation(format!(
                        "'>' must be the last token in filter '{raw}'"
                    )));
                }
                other => check_token(other)?,
            }
        }
        Ok(Self(raw))
    }

    /// 匹配所有主题
    pub fn all() -> Self {
        Self(TAIL.to_string())
    }

    /// `{source}.{suffix}.{aggregate_id}.>`
    pub fn for_aggregate(source: &str, suffix: &str, aggregate_id: &str) -> DomainResult<Self> {
        check_token(aggregate_id)?;
        Self::parse(format!("{source}.{suffix}.{aggregate_id}.{TAIL}"))
    }

    /// `{source}.{suffix}.*.{event_type}`
    pub fn for_event_type(source: &str, suffix: &str, event_type: &str) -> DomainResult<Self> {
        Self::parse(format!("{source}.{suffix}.{SINGLE}.{event_type}"))
    }

    /// `{source}.{suffix}.>`
    pub fn for_stream(source: &str, suffix: &str) -> DomainResult<Self> {
        Self::parse(format!("{source}.{suffix}.{TAIL}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, subject: &Subject) -> bool {
        let mut pattern = self.0.split('.');
        let mut tokens = subject.tokens();
        loop {
            match (pattern.next(), tokens.next()) {
                (Some(TAIL), Some(_)) => return true,
                (Some(SINGLE), Some(_)) => {}
                (Some(p), Some(t)) if p == t => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl fmt::Display for SubjectFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Subject> for SubjectFilter {
    fn from(subject: Subject) -> Self {
        Self(subject.0)
    }
}
