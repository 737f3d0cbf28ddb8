//! 进程内的匹配通知通道
//!
//! 基于 `tokio::sync::broadcast`：`notify` 克隆并广播通知，订阅方按用户过滤。
//! 没有订阅者时发送失败被视为非致命，通知直接丢弃（至少一次语义由上游负责）。
//!
use crate::domain::match_aggregate::{Match, MatchId};
use crate::domain::notifications::NotificationsChannel;
use crate::domain::user::UserId;
use async_trait::async_trait;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use randomtalk_domain::entity::Entity;
use randomtalk_domain::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

/// 推送给单个参与者的通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchNotification {
    pub match_id: MatchId,
    /// 接收者
    pub user_id: UserId,
    /// 发起方在前
    pub participant_ids: Vec<UserId>,
    /// `{stream}.users.{user_id}.match_found`
    pub subject: String,
}

pub struct BroadcastNotificationsChannel {
    stream_name: String,
    tx: broadcast::Sender<MatchNotification>,
    published: AtomicUsize,
}

impl BroadcastNotificationsChannel {
    /// `capacity` 为广播缓冲区容量，至少为 1
    pub fn new(stream_name: impl Into<String>, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            stream_name: stream_name.into(),
            tx,
            published: AtomicUsize::new(0),
        }
    }

    pub fn subject_for(&self, user_id: &UserId) -> String {
        format!("{}.users.{user_id}.match_found", self.stream_name)
    }

    /// 已发出的通知数量（不论是否有订阅者）
    pub fn published(&self) -> usize {
        self.published.load(Ordering::Relaxed)
    }

    /// 全部通知；订阅方落后时产生 `TransientIo` 错误项
    pub fn subscribe(&self) -> BoxStream<'static, DomainResult<MatchNotification>> {
        BroadcastStream::new(self.tx.subscribe())
            .map(|item| item.map_err(lagged))
            .boxed()
    }

    /// 单个用户的通知；落后丢失的消息记录告警后跳过
    pub fn subscribe_user(&self, user_id: UserId) -> BoxStream<'static, MatchNotification> {
        BroadcastStream::new(self.tx.subscribe())
            .filter_map(move |item| {
                let picked = match item {
                    Ok(notification) if notification.user_id == user_id => Some(notification),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!(user_id = %user_id, error = %err, "notification subscriber lagged");
                        None
                    }
                };
                futures_util::future::ready(picked)
            })
            .boxed()
    }
}

fn lagged(err: BroadcastStreamRecvError) -> DomainError {
    DomainError::transient_io(err.to_string())
}

#[async_trait]
impl NotificationsChannel for BroadcastNotificationsChannel {
    async fn notify(&self, user_id: &UserId, matched: &Match) -> DomainResult<()> {
        let notification = MatchNotification {
            match_id: matched.id().clone(),
            user_id: user_id.clone(),
            participant_ids: matched.participant_ids().into_iter().cloned().collect(),
            subject: self.subject_for(user_id),
        };
        self.published.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(notification).is_err() {
            tracing::debug!(user_id = %user_id, "no notification subscribers");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gender::Gender;
    use crate::domain::preferences::Preferences;
    use crate::domain::user::User;

    fn matched(id: &str, a: &str, b: &str) -> Match {
        let snap = |u: &str| User::new(u.to_string(), 30, Gender::Unspecified, Preferences::default()).snapshot();
        Match::create(MatchId::new(id), snap(a), snap(b))
            .unwrap()
            .into_inner()
    }

    #[tokio::test]
    async fn notify_without_subscribers_is_not_an_error() {
        let channel = BroadcastNotificationsChannel::new("randomtalk_matchmaking", 4);
        channel
            .notify(&UserId::new("a"), &matched("m-1", "a", "b"))
            .await
            .unwrap();
        assert_eq!(channel.published(), 1);
    }

    #[tokio::test]
    async fn user_subscription_only_sees_its_own_notifications() {
        let channel = BroadcastNotificationsChannel::new("randomtalk_matchmaking", 8);
        let mut for_b = channel.subscribe_user(UserId::new("b"));
        let m = matched("m-1", "a", "b");

        channel.notify(&UserId::new("a"), &m).await.unwrap();
        channel.notify(&UserId::new("b"), &m).await.unwrap();

        let got = for_b.next().await.unwrap();
        assert_eq!(got.match_id, MatchId::new("m-1"));
        assert_eq!(got.user_id, UserId::new("b"));
        assert_eq!(got.participant_ids, vec![UserId::new("a"), UserId::new("b")]);
        assert_eq!(got.subject, "randomtalk_matchmaking.users.b.match_found");
    }

    #[tokio::test]
    async fn slow_subscriber_reports_lag() {
        let channel = BroadcastNotificationsChannel::new("randomtalk_matchmaking", 1);
        let mut all = channel.subscribe();
        let m = matched("m-1", "a", "b");
        channel.notify(&UserId::new("a"), &m).await.unwrap();
        channel.notify(&UserId::new("b"), &m).await.unwrap();

        let first = all.next().await.unwrap();
        assert!(first.unwrap_err().is_retryable());
        let second = all.next().await.unwrap().unwrap();
        assert_eq!(second.user_id, UserId::new("b"));
    }
}
