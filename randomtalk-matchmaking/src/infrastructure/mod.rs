//! 协作方的进程内实现
//!
pub mod broadcast_notifications;
pub mod event_log_match_repository;
pub mod match_request_consumer;
pub mod memory_user_store;

pub use broadcast_notifications::{BroadcastNotificationsChannel, MatchNotification};
pub use event_log_match_repository::{EventLogMatchRepository, match_codec};
pub use match_request_consumer::{
    ConsumerHandle, Delivery, MatchRequestConsumer, RequestedPreferences, UserMatchRequested,
};
pub use memory_user_store::MemoryUserStore;
