//! 性别（Gender）
//!
//! 文本形式统一为小写；解析大小写不敏感，未知取值视为未指定，空文本为解析错误。
//!
use randomtalk_domain::error::DomainError;
use randomtalk_macros::value_object;
use std::fmt;
use std::str::FromStr;

#[value_object]
#[derive(Copy, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum Gender {
    #[default]
    Unspecified,
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Female => "female",
            Self::Male => "male",
        }
    }

    pub fn is_specified(&self) -> bool {
        !matches!(self, Self::Unspecified)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::parse("gender is empty"));
        }
        Ok(match s.to_ascii_lowercase().as_str() {
            "female" => Self::Female,
            "male" => Self::Male,
            _ => Self::Unspecified,
        })
    }
}

impl TryFrom<String> for Gender {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Gender> for String {
    fn from(gender: Gender) -> Self {
        gender.as_str().to_string()
    }
}
