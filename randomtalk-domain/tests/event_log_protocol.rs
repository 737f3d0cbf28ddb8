use anyhow::Result as AnyResult;
use async_trait::async_trait;
use futures_util::StreamExt;
use randomtalk_domain::error::ErrorKind;
use randomtalk_domain::event_log::{
    EventRecord, EventStream, Expectation, Journal, JournalError, JournalEventStream,
    MemoryJournal, ReadBatch, RetryPolicy, Subject, SubjectFilter,
};
use randomtalk_domain::value_object::Version;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SOURCE: &str = "randomtalk.test";
const SUFFIX: &str = "rooms";

fn record(aggregate_id: &str, event_type: &str, version: u64) -> EventRecord {
    record_with_id(&ulid::Ulid::new().to_string(), aggregate_id, event_type, version)
}

fn record_with_id(id: &str, aggregate_id: &str, event_type: &str, version: u64) -> EventRecord {
    EventRecord::builder()
        .id(id)
        .event_type(event_type)
        .source(SOURCE)
        .subject(Subject::for_event(SOURCE, SUFFIX, aggregate_id, event_type).unwrap())
        .data_schema("schemas.randomtalk.com/test/room/events/opened/1")
        .aggregate_version(Version::from_value(version))
        .payload(br#"{"ok":true}"#.to_vec())
        .build()
}

/// 前 `failures` 次写入返回瞬时故障的日志
struct FlakyJournal {
    inner: MemoryJournal,
    failures: u32,
    publishes: AtomicU32,
}

impl FlakyJournal {
    fn new(failures: u32) -> Self {
        Self {
            inner: MemoryJournal::new("flaky"),
            failures,
            publishes: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Journal for FlakyJournal {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn publish(
        &self,
        record: EventRecord,
        expectation: Expectation,
    ) -> Result<u64, JournalError> {
        if self.publishes.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(JournalError::Unavailable("broker restarting".into()));
        }
        self.inner.publish(record, expectation).await
    }

    async fn last_sequence(&self, filter: &SubjectFilter) -> Result<u64, JournalError> {
        self.inner.last_sequence(filter).await
    }

    async fn last(&self, filter: &SubjectFilter) -> Result<Option<EventRecord>, JournalError> {
        self.inner.last(filter).await
    }

    async fn read(
        &self,
        filter: &SubjectFilter,
        from: u64,
        limit: usize,
    ) -> Result<ReadBatch, JournalError> {
        self.inner.read(filter, from, limit).await
    }

    async fn count(&self, filter: &SubjectFilter) -> Result<u64, JournalError> {
        self.inner.count(filter).await
    }

    async fn wait_beyond(&self, after: u64, max_wait: Duration) -> Result<bool, JournalError> {
        self.inner.wait_beyond(after, max_wait).await
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(3)
        .wait(Duration::from_millis(5))
        .build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_of_one_aggregate_have_a_single_winner() -> AnyResult<()> {
    let stream = Arc::new(JournalEventStream::new(Arc::new(MemoryJournal::new("rooms"))));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let stream = stream.clone();
        tasks.push(tokio::spawn(async move {
            stream.append(vec![record("r-1", "opened", 1)]).await
        }));
    }

    let mut won = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await? {
            Ok(_) => won += 1,
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::Conflict, "{err}");
                conflicts += 1;
            }
        }
    }
    assert_eq!((won, conflicts), (1, 7));

    let filter = SubjectFilter::for_aggregate(SOURCE, SUFFIX, "r-1")?;
    assert_eq!(stream.pull(0, &filter).await?.len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_aggregates_never_contend() -> AnyResult<()> {
    let stream = Arc::new(JournalEventStream::new(Arc::new(MemoryJournal::new("rooms"))));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let stream = stream.clone();
        tasks.push(tokio::spawn(async move {
            let id = format!("r-{i}");
            stream
                .append(vec![record(&id, "opened", 1), record(&id, "renamed", 2)])
                .await
        }));
    }
    for task in tasks {
        assert_eq!(task.await??.num_events, 2);
    }

    let everything = stream.pull(0, &SubjectFilter::for_stream(SOURCE, SUFFIX)?).await?;
    assert_eq!(everything.len(), 16);
    Ok(())
}

#[tokio::test]
async fn transient_failures_are_retried_up_to_max_attempts() -> AnyResult<()> {
    let journal = Arc::new(FlakyJournal::new(2));
    let stream = JournalEventStream::builder()
        .journal(journal.clone())
        .retry(fast_retry())
        .build();

    let out = stream.append(vec![record("r-1", "opened", 1)]).await?;
    assert_eq!(out.last_sequence, 1);
    assert_eq!(journal.publishes.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn exhausted_retries_surface_as_transient_io() {
    let stream = JournalEventStream::builder()
        .journal(Arc::new(FlakyJournal::new(10)))
        .retry(fast_retry())
        .build();

    let err = stream
        .append(vec![record("r-1", "opened", 1)])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransientIo);
    assert!(err.is_retryable());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_follows_live_appends_for_its_filter_only() -> AnyResult<()> {
    let stream = Arc::new(
        JournalEventStream::builder()
            .journal(Arc::new(MemoryJournal::new("rooms")))
            .fetch_max_wait(Duration::from_millis(50))
            .build(),
    );
    let cancel = CancellationToken::new();
    let filter = SubjectFilter::for_event_type(SOURCE, SUFFIX, "opened")?;
    let mut batches = stream.fetch(10, filter, cancel.clone());

    let writer = {
        let stream = stream.clone();
        tokio::spawn(async move {
            for i in 0..3 {
                let id = format!("r-{i}");
                stream.append(vec![record(&id, "opened", 1)]).await?;
                stream.append(vec![record(&id, "renamed", 2)]).await?;
            }
            Ok::<_, randomtalk_domain::error::DomainError>(())
        })
    };

    let mut opened = Vec::new();
    while opened.len() < 3 {
        let batch = tokio::time::timeout(Duration::from_secs(5), batches.next())
            .await?
            .expect("stream ends only on cancel")?;
        opened.extend(batch.into_iter().map(|r| r.event_type().to_string()));
    }
    writer.await??;
    assert!(opened.iter().all(|t| t == "opened"));

    cancel.cancel();
    assert!(batches.next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn batch_failing_midway_keeps_the_events_already_written() -> AnyResult<()> {
    let stream = JournalEventStream::new(Arc::new(MemoryJournal::new("rooms")));
    let opened = record("room-1", "opened", 1);
    stream.append(vec![opened.clone()]).await?;

    // 第二条复用了已存在的事件 ID
    let batch = vec![
        record("room-1", "renamed", 2),
        record_with_id(opened.id(), "room-1", "closed", 3),
    ];
    let err = stream.append(batch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let filter = SubjectFilter::for_aggregate(SOURCE, SUFFIX, "room-1")?;
    let stored = stream.pull(0, &filter).await?;
    let types: Vec<&str> = stored.iter().map(|r| r.event_type()).collect();
    assert_eq!(types, ["opened", "renamed"]);
    Ok(())
}
