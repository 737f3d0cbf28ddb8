use anyhow::Result as AnyResult;
use async_trait::async_trait;
use randomtalk_application::command_bus::CommandBus;
use randomtalk_application::context::AppContext;
use randomtalk_application::error::AppError;
use randomtalk_application::query_bus::QueryBus;
use randomtalk_domain::domain_event::BusinessContext;
use randomtalk_domain::error::{DomainError, DomainResult, ErrorKind};
use randomtalk_domain::event_log::{EventRecord, EventStream, RetryPolicy, Subject};
use randomtalk_domain::value_object::Version;
use randomtalk_matchmaking::application::{
    FindLastMatchByUser, FindMatchById, MatchUserWithPreferences, RequestStatus,
};
use randomtalk_matchmaking::config::MatchmakingConfig;
use randomtalk_matchmaking::domain::{
    Gender, MatchId, MatchOutcome, MatchRepository, MatchmakingProcessor, Preferences, User, UserId,
};
use randomtalk_matchmaking::infrastructure::match_request_consumer::{
    CHAT_EVENT_SOURCE, MATCH_REQUESTS_SUFFIX, USER_MATCH_REQUESTED,
};
use randomtalk_matchmaking::infrastructure::{
    MatchRequestConsumer, RequestedPreferences, UserMatchRequested,
};
use randomtalk_matchmaking::service::MatchmakingService;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn fast_config() -> MatchmakingConfig {
    let mut config = MatchmakingConfig::default();
    config.persistence.fetch.max_wait_ms = 50;
    config.consumer.concurrency = 1;
    config
}

fn match_user(user_id: &str, user_age: u32) -> MatchUserWithPreferences {
    MatchUserWithPreferences {
        user_id: user_id.into(),
        user_age,
        user_gender: Gender::Unspecified,
        user_preferences: Preferences::default(),
    }
}

fn ctx() -> AppContext {
    AppContext::default().with_biz(
        BusinessContext::builder()
            .correlation_id(uuid::Uuid::new_v4().to_string())
            .build(),
    )
}

/// 轮询直到条件成立或超时
async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn command_and_queries_round_trip_through_the_buses() -> AnyResult<()> {
    let service = MatchmakingService::build(MatchmakingConfig::default())?;

    let first = service.commands().dispatch(&ctx(), match_user("a", 25)).await?;
    assert_eq!(first.status, RequestStatus::Waiting);
    assert_eq!(first.match_id, None);

    let second = service.commands().dispatch(&ctx(), match_user("b", 22)).await?;
    assert_eq!(second.status, RequestStatus::Matched);
    assert_eq!(second.partner_id.as_deref(), Some("a"));
    let match_id = second.match_id.expect("matched outcome carries an id");

    let by_id = service
        .queries()
        .dispatch(&ctx(), FindMatchById { match_id: MatchId::new(match_id.clone()) })
        .await?;
    assert_eq!(by_id.match_id, match_id);
    assert_eq!(by_id.version, 1);
    assert_eq!(by_id.requester.map(|u| u.id), Some(UserId::new("b")));

    let by_user = service
        .queries()
        .dispatch(&ctx(), FindLastMatchByUser { user_id: UserId::new("a") })
        .await?;
    assert_eq!(by_user.match_id, match_id);
    Ok(())
}

#[tokio::test]
async fn invalid_commands_and_unknown_matches_are_typed_errors() -> AnyResult<()> {
    let service = MatchmakingService::build(MatchmakingConfig::default())?;

    let err = service
        .commands()
        .dispatch(&ctx(), match_user("a", 12))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(service.pool().is_empty());

    let err = service
        .queries()
        .dispatch(&ctx(), FindMatchById { match_id: MatchId::new("missing") })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));

    let err = service
        .queries()
        .dispatch(&ctx(), FindLastMatchByUser { user_id: UserId::new("nobody") })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    Ok(())
}

#[tokio::test]
async fn cancelled_context_stops_the_command() -> AnyResult<()> {
    let service = MatchmakingService::build(MatchmakingConfig::default())?;
    let ctx = ctx();
    ctx.cancellation.cancel();

    let err = service
        .commands()
        .dispatch(&ctx, match_user("a", 25))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Cancelled));
    assert!(service.pool().is_empty());
    Ok(())
}

fn requested(request_id: &str, user_id: &str, age: u32) -> UserMatchRequested {
    UserMatchRequested {
        request_id: request_id.into(),
        user_id: UserId::new(user_id),
        age,
        gender: Gender::Female,
        preferences: RequestedPreferences::default(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn consumer_turns_published_requests_into_matches() -> AnyResult<()> {
    let service = MatchmakingService::build(fast_config())?;
    let consumer = service.start_consumer()?.expect("consumer enabled by default");

    // 无法解码的请求被跳过，不影响后续请求
    let garbage = EventRecord::builder()
        .id("req-garbage")
        .event_type(USER_MATCH_REQUESTED)
        .source(CHAT_EVENT_SOURCE)
        .subject(Subject::for_event(
            CHAT_EVENT_SOURCE,
            MATCH_REQUESTS_SUFFIX,
            "req-garbage",
            USER_MATCH_REQUESTED,
        )?)
        .data_schema("schemas.randomtalk.com/chat/notifications/user_match_requested/1")
        .aggregate_version(Version::from_value(1))
        .payload(b"not json".to_vec())
        .build();
    service.stream().append(vec![garbage]).await?;

    service.publish_match_request(&requested("req-1", "a", 25)).await?;
    let pool = service.pool();
    assert!(eventually(|| async move { pool.contains(&UserId::new("a")) }).await);

    service.publish_match_request(&requested("req-2", "b", 31)).await?;
    let matches = service.matches().clone();
    assert!(
        eventually(|| {
            let matches = matches.clone();
            async move { matches.find_last_by_user_id(&UserId::new("b")).await.is_ok() }
        })
        .await
    );

    let found = matches.find_last_by_user_id(&UserId::new("a")).await?;
    assert!(found.involves(&UserId::new("b")));
    assert!(service.pool().is_empty());

    consumer.shutdown();
    tokio::time::timeout(Duration::from_secs(2), consumer.join()).await?;
    Ok(())
}

#[tokio::test]
async fn disabled_consumer_is_not_started() -> AnyResult<()> {
    let mut config = fast_config();
    config.consumer.enabled = false;
    let service = MatchmakingService::build(config)?;
    assert!(service.start_consumer()?.is_none());
    Ok(())
}

/// 前 `failures` 次调用返回 `failure()`，之后都让用户进入等待
struct FlakyProcessor {
    calls: AtomicUsize,
    failures: usize,
    failure: fn() -> DomainError,
}

impl FlakyProcessor {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MatchmakingProcessor for FlakyProcessor {
    async fn process_match_request(
        &self,
        _user: User,
        _context: &BusinessContext,
        _cancel: &CancellationToken,
    ) -> DomainResult<MatchOutcome> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err((self.failure)());
        }
        Ok(MatchOutcome::Waiting)
    }
}

/// 发布一条请求，等处理次数达到 `expected` 后再多等一会儿，关闭消费者并返回处理次数
async fn consume_one_request(
    failures: usize,
    failure: fn() -> DomainError,
    expected: usize,
) -> AnyResult<usize> {
    let service = MatchmakingService::build(fast_config())?;
    let processor = Arc::new(FlakyProcessor {
        calls: AtomicUsize::new(0),
        failures,
        failure,
    });
    let consumer = Arc::new(
        MatchRequestConsumer::builder()
            .stream(service.stream().clone())
            .processor(processor.clone())
            .redelivery(RetryPolicy::builder().max_attempts(3).wait(Duration::from_millis(20)).build())
            .build(),
    );
    let handle = consumer.start()?;

    service.publish_match_request(&requested("req-flaky", "a", 25)).await?;
    let flaky = &*processor;
    assert!(eventually(|| async move { flaky.calls() >= expected }).await);
    tokio::time::sleep(Duration::from_millis(200)).await;

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(2), handle.join()).await?;
    Ok(processor.calls())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transient_failures_are_redelivered() -> AnyResult<()> {
    let calls = consume_one_request(1, || DomainError::transient_io("journal unavailable"), 2).await?;
    assert_eq!(calls, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn losing_the_pool_race_is_redelivered() -> AnyResult<()> {
    let calls = consume_one_request(1, || DomainError::not_found("user a is no longer waiting"), 2).await?;
    assert_eq!(calls, 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_requests_are_not_redelivered() -> AnyResult<()> {
    let calls = consume_one_request(1, || DomainError::validation("age out of range"), 1).await?;
    assert_eq!(calls, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn redelivery_stops_after_max_attempts() -> AnyResult<()> {
    let calls = consume_one_request(usize::MAX, || DomainError::transient_io("journal unavailable"), 3).await?;
    assert_eq!(calls, 3);
    Ok(())
}

struct PanickingProcessor;

#[async_trait]
impl MatchmakingProcessor for PanickingProcessor {
    async fn process_match_request(
        &self,
        _user: User,
        _context: &BusinessContext,
        _cancel: &CancellationToken,
    ) -> DomainResult<MatchOutcome> {
        panic!("processor bug");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn join_reports_a_crashed_consumer_instead_of_propagating() -> AnyResult<()> {
    let service = MatchmakingService::build(fast_config())?;
    let consumer = Arc::new(
        MatchRequestConsumer::builder()
            .stream(service.stream().clone())
            .processor(Arc::new(PanickingProcessor))
            .build(),
    );
    let handle = consumer.start()?;
    service.publish_match_request(&requested("req-crash", "a", 25)).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(2), handle.join()).await?;
    Ok(())
}
