//! 匹配偏好（Preferences）
//!
//! 偏好是一个谓词对象：`is_satisfied_by` 依次检查年龄区间、性别过滤、兴趣交集与距离。
//! 两个用户能否配对要求双向都满足。
//!
use super::gender::Gender;
use super::location::Location;
use randomtalk_macros::value_object;
use serde::{Deserialize, Serializer};
use std::fmt;
use std::time::Duration;

pub const MIN_ALLOWED_AGE: u32 = 18;
pub const MAX_ALLOWED_AGE: u32 = 99;
pub const DEFAULT_MAX_WAIT_TIME: Duration = Duration::from_secs(10);

/// 偏好谓词所需的候选人视图
pub trait Candidate {
    fn age(&self) -> u32;

    fn gender(&self) -> Gender;

    fn preferences(&self) -> &Preferences;

    fn location(&self) -> Option<&Location> {
        None
    }
}

/// 距离限制：以 `origin` 为中心、`km` 为半径
#[value_object(eq = false, default = false)]
pub struct MaxDistance {
    pub origin: Location,
    pub km: f64,
}

#[value_object(eq = false, default = false)]
#[serde(from = "PreferencesDocument")]
pub struct Preferences {
    min_age: u32,
    max_age: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<Gender>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    interests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_distance: Option<MaxDistance>,
    #[serde(rename = "max_wait_time_seconds", serialize_with = "as_seconds")]
    max_wait_time: Duration,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            min_age: MIN_ALLOWED_AGE,
            max_age: MAX_ALLOWED_AGE,
            gender: None,
            interests: Vec::new(),
            max_distance: None,
            max_wait_time: DEFAULT_MAX_WAIT_TIME,
        }
    }
}

impl Preferences {
    /// 低于下限时取 18
    pub fn with_min_age(mut self, min_age: u32) -> Self {
        self.min_age = min_age.max(MIN_ALLOWED_AGE);
        self
    }

    /// 0 或超过上限时取 99
    pub fn with_max_age(mut self, max_age: u32) -> Self {
        self.max_age = if max_age == 0 || max_age > MAX_ALLOWED_AGE {
            MAX_ALLOWED_AGE
        } else {
            max_age
        };
        self
    }

    /// 未指定性别时不设过滤
    pub fn with_gender(mut self, gender: Gender) -> Self {
        if gender.is_specified() {
            self.gender = Some(gender);
        }
        self
    }

    /// 空列表保持原值
    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let interests: Vec<String> = interests.into_iter().map(Into::into).collect();
        if !interests.is_empty() {
            self.interests = interests;
        }
        self
    }

    pub fn with_max_distance(mut self, origin: Location, km: f64) -> Self {
        self.max_distance = Some(MaxDistance { origin, km });
        self
    }

    pub fn with_max_wait_time(mut self, max_wait_time: Duration) -> Self {
        self.max_wait_time = max_wait_time;
        self
    }

    pub fn min_age(&self) -> u32 {
        self.min_age
    }

    pub fn max_age(&self) -> u32 {
        self.max_age
    }

    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    pub fn interests(&self) -> &[String] {
        &self.interests
    }

    pub fn max_distance(&self) -> Option<&MaxDistance> {
        self.max_distance.as_ref()
    }

    pub fn max_wait_time(&self) -> Duration {
        self.max_wait_time
    }

    pub fn is_satisfied_by<C: Candidate + ?Sized>(&self, candidate: &C) -> bool {
        let age = candidate.age();
        if age < self.min_age || age > self.max_age {
            return false;
        }

        if self.gender.is_some_and(|wanted| wanted != candidate.gender()) {
            return false;
        }

        if !self.interests.is_empty() {
            let theirs = candidate.preferences().interests();
            if !self.interests.iter().any(|want| theirs.contains(want)) {
                return false;
            }
        }

        match &self.max_distance {
            Some(limit) if limit.km > 0.0 => candidate
                .location()
                .is_some_and(|at| limit.origin.distance_km(at) <= limit.km),
            _ => true,
        }
    }
}

impl fmt::Display for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{MinAge: {}, MaxAge: {}", self.min_age, self.max_age)?;
        if let Some(gender) = self.gender {
            write!(f, ", Gender: {gender}")?;
        }
        if !self.interests.is_empty() {
            write!(f, ", Interests: [{}]", self.interests.join(", "))?;
        }
        f.write_str("}")
    }
}

fn as_seconds<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

/// 反序列化的中间形态：缺失或为 0 的年龄取默认值
#[derive(Default, Deserialize)]
#[serde(default)]
struct PreferencesDocument {
    min_age: u32,
    max_age: u32,
    gender: Option<Gender>,
    interests: Vec<String>,
    max_distance: Option<MaxDistance>,
    max_wait_time_seconds: Option<u64>,
}

impl From<PreferencesDocument> for Preferences {
    fn from(doc: PreferencesDocument) -> Self {
        let mut prefs = Preferences {
            min_age: if doc.min_age == 0 {
                MIN_ALLOWED_AGE
            } else {
                doc.min_age
            },
            max_age: if doc.max_age == 0 {
                MAX_ALLOWED_AGE
            } else {
                doc.max_age
            },
            gender: doc.gender.filter(Gender::is_specified),
            interests: doc.interests,
            max_distance: doc.max_distance,
            ..Preferences::default()
        };
        if let Some(secs) = doc.max_wait_time_seconds {
            prefs.max_wait_time = Duration::from_secs(secs);
        }
        prefs
    }
}
