//! 匹配请求消费者
//!
//! 通过 `EventStream::fetch` 订阅聊天上下文发布的 `user_match_requested` 事件，
//! 解码为 `User` 后交给处理器。单个批次内以有限并发处理。
//! 瞬时故障与等待池竞争失败（`NotFound`）会在 `redelivery.wait` 之后重投，
//! 总处理次数不超过 `redelivery.max_attempts`；其余失败记录日志后丢弃。
//!
use crate::domain::gender::Gender;
use crate::domain::preferences::Preferences;
use crate::domain::processor::{MatchOutcome, MatchmakingProcessor};
use crate::domain::user::{User, UserId};
use bon::Builder;
use futures_util::{StreamExt, future, stream};
use randomtalk_domain::domain_event::BusinessContext;
use randomtalk_domain::error::{DomainError, DomainResult, ErrorKind};
use randomtalk_domain::event_log::{EventRecord, EventStream, RetryPolicy, Subject, SubjectFilter};
use randomtalk_domain::value_object::Version;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const CHAT_EVENT_SOURCE: &str = "randomtalk.chat";
pub const MATCH_REQUESTS_SUFFIX: &str = "match_requests";
pub const USER_MATCH_REQUESTED: &str = "user_match_requested";
const USER_MATCH_REQUESTED_SCHEMA: &str =
    "schemas.randomtalk.com/chat/notifications/user_match_requested/1";

/// 聊天上下文发出的匹配请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMatchRequested {
    pub request_id: String,
    pub user_id: UserId,
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub preferences: RequestedPreferences,
}

/// 请求携带的原始偏好，未经钳制
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestedPreferences {
    pub min_age: u32,
    pub max_age: u32,
    pub gender: Gender,
    pub interests: Vec<String>,
}

impl UserMatchRequested {
    pub fn into_user(self) -> User {
        let preferences = Preferences::default()
            .with_min_age(self.preferences.min_age)
            .with_max_age(self.preferences.max_age)
            .with_gender(self.preferences.gender)
            .with_interests(self.preferences.interests);
        User::new(self.user_id, self.age, self.gender, preferences)
    }

    /// 以聊天上下文的主题布局编码，供发布方与测试使用
    pub fn to_record(&self) -> DomainResult<EventRecord> {
        let subject = Subject::for_event(
            CHAT_EVENT_SOURCE,
            MATCH_REQUESTS_SUFFIX,
            &self.request_id,
            USER_MATCH_REQUESTED,
        )?;
        Ok(EventRecord::builder()
            .id(self.request_id.clone())
            .event_type(USER_MATCH_REQUESTED)
            .source(CHAT_EVENT_SOURCE)
            .subject(subject)
            .data_schema(USER_MATCH_REQUESTED_SCHEMA)
            .aggregate_version(Version::from_value(1))
            .payload(serde_json::to_vec(self)?)
            .correlation_id(self.request_id.clone())
            .build())
    }
}

/// 单条请求的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Processed(MatchOutcome),
    /// 无法解码或不可重试的失败，直接丢弃
    Discarded,
    /// 瞬时故障，或在等待池竞争中落败（`NotFound`），需要重投
    Redeliver,
}

#[derive(Builder)]
pub struct MatchRequestConsumer {
    stream: Arc<dyn EventStream>,
    processor: Arc<dyn MatchmakingProcessor>,
    /// 单个批次内的处理并发
    #[builder(default = 8)]
    concurrency: usize,
    #[builder(default = 32)]
    batch_size: usize,
    /// `max_attempts` 为单条请求的总处理次数，`wait` 为两轮重投之间的间隔
    #[builder(default)]
    redelivery: RetryPolicy,
}

/// 等待重投的请求及其已处理次数
type Pending = Vec<(EventRecord, u32)>;

impl MatchRequestConsumer {
    pub fn filter() -> DomainResult<SubjectFilter> {
        SubjectFilter::for_event_type(CHAT_EVENT_SOURCE, MATCH_REQUESTS_SUFFIX, USER_MATCH_REQUESTED)
    }

    /// 启动后台消费任务
    pub fn start(self: Arc<Self>) -> DomainResult<ConsumerHandle> {
        let filter = Self::filter()?;
        let token = CancellationToken::new();
        let task = tokio::spawn(self.run(filter, token.clone()));
        Ok(ConsumerHandle {
            token,
            task: Some(task),
        })
    }

    async fn run(self: Arc<Self>, filter: SubjectFilter, token: CancellationToken) {
        tracing::info!(stream = %self.stream.name(), filter = %filter, "match request consumer started");
        let mut batches = self.stream.fetch(self.batch_size, filter, token.clone());
        let mut pending: Pending = Vec::new();
        let mut retry_at: Option<Instant> = None;

        loop {
            let due = retry_at.unwrap_or_else(Instant::now);
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep_until(due), if retry_at.is_some() => {
                    let retries = std::mem::take(&mut pending);
                    tracing::debug!(count = retries.len(), "redelivering match requests");
                    pending = self.process(retries).await;
                }
                next = batches.next() => match next {
                    Some(Ok(records)) => {
                        let fresh = records.into_iter().map(|record| (record, 0)).collect();
                        let failed = self.process(fresh).await;
                        pending.extend(failed);
                    }
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "failed to fetch match requests");
                    }
                    None => break,
                },
            }
            retry_at = match (pending.is_empty(), retry_at) {
                (true, _) => None,
                (false, Some(at)) if at > Instant::now() => Some(at),
                (false, _) => Some(Instant::now() + self.redelivery.wait),
            };
        }

        if !pending.is_empty() {
            tracing::warn!(count = pending.len(), "match requests left undelivered at shutdown");
        }
        tracing::info!("match request consumer stopped");
    }

    /// 以有限并发处理一批请求，返回仍需重投的部分
    async fn process(&self, records: Pending) -> Pending {
        let max_attempts = self.redelivery.max_attempts.max(1);
        stream::iter(records)
            .map(|(record, attempts)| async move {
                match self.handle(&record).await {
                    Delivery::Redeliver if attempts + 1 < max_attempts => Some((record, attempts + 1)),
                    Delivery::Redeliver => {
                        tracing::error!(
                            event_id = %record.id(),
                            attempts = attempts + 1,
                            "giving up on match request"
                        );
                        None
                    }
                    Delivery::Processed(_) | Delivery::Discarded => None,
                }
            })
            .buffer_unordered(self.concurrency.max(1))
            .filter_map(future::ready)
            .collect()
            .await
    }

    /// 处理单条请求
    ///
    /// 使用独立的取消令牌：关闭消费者不会中断已开始的请求。
    #[tracing::instrument(skip_all, fields(event_id = %record.id()))]
    pub async fn handle(&self, record: &EventRecord) -> Delivery {
        let request = match record.decode_payload::<UserMatchRequested>() {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "discarding undecodable match request");
                return Delivery::Discarded;
            }
        };

        let context = BusinessContext::builder()
            .maybe_correlation_id(record.correlation_id())
            .causation_id(record.id())
            .actor_id(request.user_id.to_string())
            .build();

        match self
            .processor
            .process_match_request(request.into_user(), &context, &CancellationToken::new())
            .await
        {
            Ok(outcome) => {
                tracing::debug!(?outcome, "match request processed");
                Delivery::Processed(outcome)
            }
            Err(err) if should_redeliver(&err) => {
                tracing::warn!(error = %err, "match request failed, scheduling redelivery");
                Delivery::Redeliver
            }
            Err(err) => {
                tracing::error!(error = %err, kind = ?err.kind(), "match request failed");
                Delivery::Discarded
            }
        }
    }
}

/// 等待池竞争落败表现为 `NotFound`，重新处理时会看到最新的等待池
fn should_redeliver(err: &DomainError) -> bool {
    err.is_retryable() || err.kind() == ErrorKind::NotFound
}

/// 消费任务句柄：用于优雅关闭与等待任务结束
pub struct ConsumerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConsumerHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        if let Err(err) = task.await {
            tracing::error!(error = %err, "match request consumer task failed");
        }
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
