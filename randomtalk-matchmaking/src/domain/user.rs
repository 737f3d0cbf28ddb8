//! 匹配视角下的用户
//!
//! 用户只驻留在等待池中，不做事件溯源；配对时以 `UserSnapshot` 的形式
//! 复制进 `Match` 聚合，使聚合可以脱离外部查询完整重建。
//!
use super::gender::Gender;
use super::location::Location;
use super::preferences::{Candidate, Preferences};
use randomtalk_macros::{entity_id, value_object};
use std::fmt;

#[entity_id]
pub struct UserId(String);

#[value_object]
#[derive(Copy)]
#[serde(from = "String", into = "String")]
pub enum UserStatus {
    #[default]
    Waiting,
    Matched,
    Rejected,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Matched => "matched",
            Self::Rejected => "rejected",
        }
    }

    /// 未知文本回落为 `Waiting`
    pub fn parse(text: &str) -> Self {
        match text.to_ascii_lowercase().as_str() {
            "matched" => Self::Matched,
            "rejected" => Self::Rejected,
            _ => Self::Waiting,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for UserStatus {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<UserStatus> for String {
    fn from(status: UserStatus) -> Self {
        status.as_str().to_string()
    }
}

#[value_object(eq = false)]
pub struct User {
    id: UserId,
    age: u32,
    gender: Gender,
    preferences: Preferences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<Location>,
    status: UserStatus,
}

impl User {
    /// 新用户处于等待状态
    pub fn new(id: impl Into<UserId>, age: u32, gender: Gender, preferences: Preferences) -> Self {
        Self {
            id: id.into(),
            age,
            gender,
            preferences,
            location: None,
            status: UserStatus::Waiting,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn is_waiting(&self) -> bool {
        self.status == UserStatus::Waiting
    }

    pub fn mark_matched(&mut self) {
        self.status = UserStatus::Matched;
    }

    pub fn mark_rejected(&mut self) {
        self.status = UserStatus::Rejected;
    }

    /// 双向兼容：彼此的偏好都被对方满足，且不是同一个人
    pub fn is_compatible_with(&self, other: &User) -> bool {
        self.id != other.id
            && self.preferences.is_satisfied_by(other)
            && other.preferences.is_satisfied_by(self)
    }

    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id.clone(),
            age: self.age,
            gender: self.gender,
            preferences: self.preferences.clone(),
            location: self.location.clone(),
        }
    }
}

impl Candidate for User {
    fn age(&self) -> u32 {
        self.age
    }

    fn gender(&self) -> Gender {
        self.gender
    }

    fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

/// 配对时刻的用户副本
#[value_object(eq = false)]
pub struct UserSnapshot {
    pub id: UserId,
    pub age: u32,
    pub gender: Gender,
    pub preferences: Preferences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Candidate for UserSnapshot {
    fn age(&self) -> u32 {
        self.age
    }

    fn gender(&self) -> Gender {
        self.gender
    }

    fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

impl From<&User> for UserSnapshot {
    fn from(user: &User) -> Self {
        user.snapshot()
    }
}
