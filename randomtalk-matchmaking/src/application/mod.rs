//! 匹配上下文的命令与查询
//!
pub mod commands;
pub mod dto;
pub mod queries;

pub use commands::{MatchUserWithPreferences, MatchUserWithPreferencesHandler};
pub use dto::{MatchDto, MatchRequestOutcome, RequestStatus};
pub use queries::{FindLastMatchByUser, FindMatchById, MatchQueryHandler};
