//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象；本模块同时提供聚合版本号 `Version`。
//!
use std::fmt;

use randomtalk_macros::value_object;

/// 值对象抽象：构造后可校验自身的业务约束
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    fn validate(&self) -> Result<(), Self::Error>;
}

/// 聚合版本号
///
/// 每应用一个事件严格加一；0 表示尚未产生任何事件的新聚合。
/// 事件日志把它作为扩展元数据随事件一起写入，重放时据此检测乱序与缺口。
///
/// ```
/// use randomtalk_domain::value_object::Version;
///
/// let v = Version::new().next();
/// assert_eq!(v.value(), 1);
/// assert!(v.follows(Version::new()));
/// ```
#[value_object]
#[derive(Copy, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// 初始版本（0）
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn from_value(value: u64) -> Self {
        Self(value)
    }

    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    /// 尚未应用任何事件
    pub const fn is_new(&self) -> bool {
        self.0 == 0
    }

    /// 是否恰好是 `previous` 的下一个版本
    pub const fn follows(&self, previous: Version) -> bool {
        self.0 == previous.0 + 1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self::from_value(value)
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_version_is_zero_and_default() {
        let v = Version::new();
        assert_eq!(v.value(), 0);
        assert!(v.is_new());
        assert_eq!(v, Version::default());
    }

    #[test]
    fn next_increments_by_exactly_one() {
        let v = Version::new().next().next().next();
        assert_eq!(v.value(), 3);
        assert!(!v.is_new());
        assert!(v.follows(Version::from_value(2)));
        assert!(!v.follows(Version::from_value(1)));
        assert!(!v.follows(v));
    }

    // 版本号按数值排序，便于重放前排序
    #[test]
    fn versions_are_ordered() {
        let mut vs = vec![
            Version::from_value(3),
            Version::from_value(1),
            Version::from_value(2),
        ];
        vs.sort();
        assert_eq!(vs, vec![1u64.into(), 2u64.into(), 3u64.into()]);
    }

    #[test]
    fn display_and_serde_use_plain_number() {
        let v = Version::from_value(42);
        assert_eq!(v.to_string(), "v42");

        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "42");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
