use randomtalk_domain::error::{DomainError, ErrorKind};

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("validation: {0}")]
    Validation(String),

    #[error("handler not found: {0}")]
    HandlerNotFound(&'static str),

    #[error("handler already registered: command={command}")]
    AlreadyRegisteredCommand { command: &'static str },

    #[error("handler already registered: query={query}, result={result}")]
    AlreadyRegisteredQuery {
        query: &'static str,
        result: &'static str,
    },

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl AppError {
    /// 领域错误分类；总线装配类错误没有对应分类
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Domain(err) => Some(err.kind()),
            Self::Validation(_) => Some(ErrorKind::Validation),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Domain(err) if err.is_retryable())
    }
}
