//! 聚合仓储
//!
//! 基于事件流（`EventStream`）的通用事件溯源仓储：保存即追加未提交事件，
//! 加载即拉取聚合范围内的全部事件并按版本重放。
//!
use super::codec::EventCodec;
use crate::aggregate::Aggregate;
use crate::aggregate_root::AggregateRoot;
use crate::domain_event::{BusinessContext, EventEnvelope};
use crate::error::{AggregateRef, DomainError, DomainResult, ErrorKind};
use crate::event_log::{AppendResult, EventStream};
use async_trait::async_trait;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

#[async_trait]
pub trait AggregateRepository<A>: Send + Sync
where
    A: Aggregate,
{
    /// 重放聚合；没有任何事件时返回 `NotFound`
    async fn load(&self, aggregate_id: &A::Id) -> DomainResult<AggregateRoot<A>>;

    /// 追加未提交事件，成功后标记为已提交；没有未提交事件时返回 `None`
    ///
    /// 失败时不标记提交，但多事件批次中靠前的事件可能已经写入（见 `EventStream::append`），
    /// 重试前应重新加载聚合。
    async fn save(
        &self,
        root: &mut AggregateRoot<A>,
        context: &BusinessContext,
    ) -> DomainResult<Option<AppendResult>>;

    async fn exists(&self, aggregate_id: &A::Id) -> DomainResult<bool>;
}

#[async_trait]
impl<A, T> AggregateRepository<A> for Arc<T>
where
    A: Aggregate,
    T: AggregateRepository<A> + ?Sized,
{
    async fn load(&self, aggregate_id: &A::Id) -> DomainResult<AggregateRoot<A>> {
        (**self).load(aggregate_id).await
    }

    async fn save(
        &self,
        root: &mut AggregateRoot<A>,
        context: &BusinessContext,
    ) -> DomainResult<Option<AppendResult>> {
        (**self).save(root, context).await
    }

    async fn exists(&self, aggregate_id: &A::Id) -> DomainResult<bool> {
        (**self).exists(aggregate_id).await
    }
}

/// 事件溯源仓储
pub struct EventSourcedRepository<A, S> {
    stream: S,
    codec: EventCodec,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A, S> EventSourcedRepository<A, S>
where
    A: Aggregate,
    S: EventStream,
{
    pub fn new(stream: S, codec: EventCodec) -> Self {
        Self {
            stream,
            codec,
            _aggregate: PhantomData,
        }
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn codec(&self) -> &EventCodec {
        &self.codec
    }

    /// 拉取某一事件类型的全部记录，按聚合分组重放（保持首次出现的追加顺序）
    ///
    /// 重放失败的聚合会被记录并跳过。
    pub async fn load_all_of_type(&self, event_type: &str) -> DomainResult<Vec<AggregateRoot<A>>> {
        let filter = self.codec.event_type_filter(event_type)?;
        let records = match self.stream.pull(0, &filter).await {
            Ok(records) => records,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut seen = HashSet::new();
        let order: Vec<String> = records
            .iter()
            .filter_map(|r| r.subject().aggregate_id())
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect();

        let mut roots = Vec::with_capacity(order.len());
        for raw in order {
            let id = raw.parse::<A::Id>().map_err(|_| {
                DomainError::parse(format!("'{raw}' is not a valid {} id", A::TYPE))
            })?;
            match self.load(&id).await {
                Ok(root) => roots.push(root),
                Err(err) => {
                    tracing::warn!(aggregate = A::TYPE, id = %raw, error = %err, "skipping aggregate that failed to load");
                }
            }
        }
        Ok(roots)
    }
}

#[async_trait]
impl<A, S> AggregateRepository<A> for EventSourcedRepository<A, S>
where
    A: Aggregate,
    S: EventStream,
{
    #[tracing::instrument(skip_all, fields(aggregate = A::TYPE, id = %aggregate_id))]
    async fn load(&self, aggregate_id: &A::Id) -> DomainResult<AggregateRoot<A>> {
        let reference = || AggregateRef::new(aggregate_id.to_string(), A::TYPE);
        let filter = self.codec.aggregate_filter(&aggregate_id.to_string())?;
        let records = self
            .stream
            .pull(0, &filter)
            .await
            .map_err(|err| err.with_aggregate(reference()))?;

        let events = records
            .iter()
            .map(|r| self.codec.decode_for::<A>(aggregate_id, r).map(|e| e.payload))
            .collect::<DomainResult<Vec<_>>>()
            .map_err(|err| err.with_aggregate(reference()))?;

        AggregateRoot::<A>::restore_from_history(aggregate_id.clone(), events).map_err(|rejected| {
            tracing::warn!(partial = ?rejected.partial().aggregate(), error = %rejected.error(), "replay rejected");
            rejected.into_error()
        })
    }

    #[tracing::instrument(skip_all, fields(aggregate = A::TYPE, id = %root.id()))]
    async fn save(
        &self,
        root: &mut AggregateRoot<A>,
        context: &BusinessContext,
    ) -> DomainResult<Option<AppendResult>> {
        if !root.has_uncommitted_events() {
            return Ok(None);
        }

        let records = root
            .uncommitted_events()
            .iter()
            .map(|event| {
                let envelope = EventEnvelope::<A>::new(root.id(), event.clone(), context.clone());
                self.codec.encode(&envelope)
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let result = self
            .stream
            .append(records)
            .await
            .map_err(|err| err.with_aggregate(root.aggregate_ref()))?;
        root.mark_committed();

        tracing::debug!(last_sequence = result.last_sequence, "aggregate saved");
        Ok(Some(result))
    }

    async fn exists(&self, aggregate_id: &A::Id) -> DomainResult<bool> {
        let filter = self.codec.aggregate_filter(&aggregate_id.to_string())?;
        match self.stream.fetch_last(&filter).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}
