//! 领域层统一错误定义
//!
//! 错误按语义分为：校验失败、未找到、并发冲突、无候选、瞬时 I/O 故障，
//! 外加序列化/解析等支撑类错误。基础设施适配层必须在边界处把后端特有错误
//! 转换为这里的分类，核心逻辑只按 `ErrorKind` 判断，不感知具体后端。
//!
use crate::value_object::Version;
use std::fmt;
use thiserror::Error;

/// 错误关联的聚合上下文（用于结构化诊断）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRef {
    pub id: String,
    pub name: String,
    pub version: Option<Version>,
}

impl AggregateRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }
}

impl fmt::Display for AggregateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.id)?;
        if let Some(v) = self.version {
            write!(f, "@{v}")?;
        }
        Ok(())
    }
}

/// 稳定的错误分类，供上层（传输层、消息消费者）映射状态码或决定是否重投
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    NoCandidates,
    TransientIo,
    Serialization,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::NoCandidates => "no_candidates",
            Self::TransientIo => "transient_io",
            Self::Serialization => "serialization",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 业务语义 ---
    #[error("validation failed: {reason}{}", suffix(.aggregate))]
    Validation {
        reason: String,
        aggregate: Option<AggregateRef>,
    },
    #[error("not found: {reason}{}", suffix(.aggregate))]
    NotFound {
        reason: String,
        aggregate: Option<AggregateRef>,
    },
    #[error("conflict: {reason}{}", suffix(.aggregate))]
    Conflict {
        reason: String,
        aggregate: Option<AggregateRef>,
    },
    #[error("no candidates: {reason}")]
    NoCandidates { reason: String },
    #[error("transient i/o failure: {reason}{}", suffix(.aggregate))]
    TransientIo {
        reason: String,
        aggregate: Option<AggregateRef>,
    },
    #[error("cancelled during {stage}")]
    Cancelled { stage: &'static str },

    // --- 序列化/解析 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("parse error: {reason}")]
    Parse { reason: String },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },
}

fn suffix(aggregate: &Option<AggregateRef>) -> String {
    match aggregate {
        Some(a) => format!(" ({a})"),
        None => String::new(),
    }
}

impl DomainError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
            aggregate: None,
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
            aggregate: None,
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
            aggregate: None,
        }
    }

    pub fn no_candidates(reason: impl Into<String>) -> Self {
        Self::NoCandidates {
            reason: reason.into(),
        }
    }

    pub fn transient_io(reason: impl Into<String>) -> Self {
        Self::TransientIo {
            reason: reason.into(),
            aggregate: None,
        }
    }

    pub fn cancelled(stage: &'static str) -> Self {
        Self::Cancelled { stage }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }

    /// 附加聚合上下文；对不携带上下文的变体无影响
    pub fn with_aggregate(mut self, aggregate_ref: AggregateRef) -> Self {
        match &mut self {
            Self::Validation { aggregate, .. }
            | Self::NotFound { aggregate, .. }
            | Self::Conflict { aggregate, .. }
            | Self::TransientIo { aggregate, .. } => *aggregate = Some(aggregate_ref),
            _ => {}
        }
        self
    }

    pub fn aggregate(&self) -> Option<&AggregateRef> {
        match self {
            Self::Validation { aggregate, .. }
            | Self::NotFound { aggregate, .. }
            | Self::Conflict { aggregate, .. }
            | Self::TransientIo { aggregate, .. } => aggregate.as_ref(),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NoCandidates { .. } => ErrorKind::NoCandidates,
            Self::TransientIo { .. } => ErrorKind::TransientIo,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Serde { .. } | Self::Parse { .. } | Self::TypeMismatch { .. } => {
                ErrorKind::Serialization
            }
        }
    }

    /// 仅瞬时 I/O 故障可在本核心之外的层级安全重试
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransientIo
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

/// 构造失败但仍返回部分构建结果的错误
///
/// 聚合在校验失败时，调用方依然可以取得已重放/已应用事件后的部分状态（例如用于日志）；
/// 需要直接向上传播时，可用 `?` 转为 `DomainError`。
#[derive(Debug)]
pub struct Rejected<T> {
    partial: T,
    error: DomainError,
}

impl<T> Rejected<T> {
    pub fn new(partial: T, error: DomainError) -> Self {
        Self { partial, error }
    }

    pub fn partial(&self) -> &T {
        &self.partial
    }

    pub fn error(&self) -> &DomainError {
        &self.error
    }

    pub fn into_parts(self) -> (T, DomainError) {
        (self.partial, self.error)
    }

    pub fn into_error(self) -> DomainError {
        self.error
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T: fmt::Debug> std::error::Error for Rejected<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<Rejected<T>> for DomainError {
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_context_is_rendered_and_exposed() {
        let err = DomainError::conflict("version already used")
            .with_aggregate(AggregateRef::new("m-1", "match").with_version(Version::from_value(1)));

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.to_string(),
            "conflict: version already used (match=m-1@v1)"
        );
        assert_eq!(err.aggregate().map(|a| a.id.as_str()), Some("m-1"));
    }

    #[test]
    fn context_is_ignored_for_variants_without_it() {
        let err = DomainError::no_candidates("pool is empty")
            .with_aggregate(AggregateRef::new("u-1", "user"));
        assert!(err.aggregate().is_none());
        assert_eq!(err.kind(), ErrorKind::NoCandidates);
    }

    #[test]
    fn only_transient_io_is_retryable() {
        assert!(DomainError::transient_io("store unreachable").is_retryable());
        assert!(!DomainError::conflict("dup").is_retryable());
        assert!(!DomainError::validation("bad").is_retryable());
        assert!(!DomainError::cancelled("persist").is_retryable());
    }

    #[test]
    fn serde_errors_classify_as_serialization() {
        let err: DomainError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn rejected_keeps_partial_and_converts_to_domain_error() {
        fn build() -> Result<u8, Rejected<u8>> {
            Err(Rejected::new(7, DomainError::validation("id not provided")))
        }
        fn propagate() -> DomainResult<u8> {
            Ok(build()?)
        }

        let rejected = build().unwrap_err();
        assert_eq!(*rejected.partial(), 7);
        assert_eq!(rejected.error().kind(), ErrorKind::Validation);
        assert_eq!(propagate().unwrap_err().kind(), ErrorKind::Validation);
    }
}
