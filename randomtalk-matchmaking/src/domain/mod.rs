//! 匹配领域模型
//!
//! 值类型（性别、位置、偏好）、等待池中的用户、`Match` 聚合、稳定匹配算法，
//! 以及处理器依赖的协作者接口。
//!
pub mod gender;
pub mod location;
pub mod match_aggregate;
pub mod match_repository;
pub mod matcher;
pub mod notifications;
pub mod preferences;
pub mod processor;
pub mod user;
pub mod user_store;

pub use gender::Gender;
pub use location::{Coordinates, Location};
pub use match_aggregate::{Match, MatchEvent, MatchId};
pub use match_repository::MatchRepository;
pub use matcher::{GaleShapleyMatcher, StableMatchFinder};
pub use notifications::NotificationsChannel;
pub use preferences::{Candidate, Preferences};
pub use processor::{MatchOutcome, MatchmakingProcessor, UserMatchProcessor};
pub use user::{User, UserId, UserSnapshot, UserStatus};
pub use user_store::UserStore;
