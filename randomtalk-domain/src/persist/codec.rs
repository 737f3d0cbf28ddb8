//! 事件编解码（EventCodec）
//!
//! 在聚合事件信封与事件日志记录之间转换：
//! - 主题：`{source}.{suffix}.{aggregate_id}.{event_type}`；
//! - schema：`{schema_base}/{aggregate}/events/{event_type}/{event_version}`；
//! - 载荷：事件枚举的 JSON 表示。
//!
use crate::aggregate::Aggregate;
use crate::domain_event::{BusinessContext, DomainEvent, EventEnvelope, Metadata};
use crate::error::{DomainError, DomainResult};
use crate::event_log::{EventRecord, Subject, SubjectFilter};
use bon::Builder;

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct EventCodec {
    /// 事件来源，如 `randomtalk.matchmaking`
    #[builder(into)]
    source: String,
    /// 流后缀，如 `matches`
    #[builder(into)]
    suffix: String,
    /// schema 前缀，如 `schemas.randomtalk.com/matchmaking`
    #[builder(into)]
    schema_base: String,
}

impl EventCodec {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn data_schema(&self, aggregate: &str, event_type: &str, event_version: usize) -> String {
        format!(
            "{}/{aggregate}/events/{event_type}/{event_version}",
            self.schema_base
        )
    }

    /// 单个聚合的全部事件
    pub fn aggregate_filter(&self, aggregate_id: &str) -> DomainResult<SubjectFilter> {
        SubjectFilter::for_aggregate(&self.source, &self.suffix, aggregate_id)
    }

    /// 所有聚合中某一类型的事件
    pub fn event_type_filter(&self, event_type: &str) -> DomainResult<SubjectFilter> {
        SubjectFilter::for_event_type(&self.source, &self.suffix, event_type)
    }

    pub fn encode<A: Aggregate>(&self, envelope: &EventEnvelope<A>) -> DomainResult<EventRecord> {
        let event = &envelope.payload;
        let subject = Subject::for_event(
            &self.source,
            &self.suffix,
            envelope.metadata.aggregate_id(),
            event.event_type(),
        )?;

        Ok(EventRecord::builder()
            .id(event.event_id())
            .event_type(event.event_type())
            .source(self.source.as_str())
            .subject(subject)
            .time(envelope.metadata.occurred_at())
            .data_schema(self.data_schema(A::TYPE, event.event_type(), event.event_version()))
            .aggregate_version(event.aggregate_version())
            .payload(serde_json::to_vec(event)?)
            .maybe_correlation_id(envelope.context.correlation_id())
            .maybe_causation_id(envelope.context.causation_id())
            .build())
    }

    pub fn decode<A: Aggregate>(&self, record: &EventRecord) -> DomainResult<EventEnvelope<A>> {
        if !A::Event::EVENT_TYPES
            .iter()
            .any(|known| *known == record.event_type())
        {
            return Err(DomainError::TypeMismatch {
                expected: A::Event::EVENT_TYPES.join("|"),
                found: record.event_type().to_string(),
            });
        }
        let aggregate_id = record.subject().aggregate_id().ok_or_else(|| {
            DomainError::parse(format!("subject {} has no aggregate id", record.subject()))
        })?;

        let payload: A::Event = record.decode_payload()?;
        if payload.aggregate_version() != record.aggregate_version() {
            return Err(DomainError::validation(format!(
                "record {} is stamped {} but its payload carries {}",
                record.id(),
                record.aggregate_version(),
                payload.aggregate_version()
            )));
        }

        let metadata = Metadata::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type(A::TYPE)
            .occurred_at(record.time())
            .maybe_sequence(record.sequence())
            .build();
        let context = BusinessContext::builder()
            .maybe_correlation_id(record.correlation_id())
            .maybe_causation_id(record.causation_id())
            .build();

        Ok(EventEnvelope {
            metadata,
            payload,
            context,
        })
    }

    /// 解码并要求记录属于指定聚合
    pub fn decode_for<A: Aggregate>(
        &self,
        aggregate_id: &A::Id,
        record: &EventRecord,
    ) -> DomainResult<EventEnvelope<A>> {
        let envelope = self.decode::<A>(record)?;
        let expected = aggregate_id.to_string();
        if envelope.metadata.aggregate_id() != expected {
            return Err(DomainError::validation(format!(
                "event {} belongs to {}, not {expected}",
                record.id(),
                envelope.metadata.aggregate_id()
            )));
        }
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value_object::Version;
    use randomtalk_macros::{domain_event, entity};

    #[entity]
    struct Lamp {
        on: bool,
    }

    #[domain_event(version = 2)]
    enum LampEvent {
        SwitchedOn,
        SwitchedOff,
    }

    impl Aggregate for Lamp {
        const TYPE: &'static str = "lamp";
        type Event = LampEvent;

        fn apply(&mut self, event: &Self::Event) {
            self.on = matches!(event, LampEvent::SwitchedOn { .. });
        }

        fn validate(&self) -> DomainResult<()> {
            Ok(())
        }
    }

    fn codec() -> EventCodec {
        EventCodec::builder()
            .source("randomtalk.home")
            .suffix("lamps")
            .schema_base("schemas.randomtalk.com/home")
            .build()
    }

    fn switched_on(id: &str) -> EventEnvelope<Lamp> {
        let context = BusinessContext::builder().correlation_id("corr-1").build();
        EventEnvelope::new(
            &id.to_string(),
            LampEvent::SwitchedOn {
                id: ulid::Ulid::new().to_string(),
                aggregate_version: Version::from_value(1),
            },
            context,
        )
    }

    #[test]
    fn encode_lays_out_subject_schema_and_extensions() {
        let record = codec().encode(&switched_on("l-1")).unwrap();
        assert_eq!(record.subject().as_str(), "randomtalk.home.lamps.l-1.switched_on");
        assert_eq!(
            record.data_schema(),
            "schemas.randomtalk.com/home/lamp/events/switched_on/2"
        );
        assert_eq!(record.aggregate_version(), Version::from_value(1));
        assert_eq!(record.correlation_id(), Some("corr-1"));
        assert!(codec().aggregate_filter("l-1").unwrap().matches(record.subject()));
        assert!(codec().event_type_filter("switched_on").unwrap().matches(record.subject()));
    }

    #[test]
    fn decode_restores_the_envelope() {
        let envelope = switched_on("l-1");
        let record = codec().encode(&envelope).unwrap();
        let decoded = codec().decode_for::<Lamp>(&"l-1".to_string(), &record).unwrap();

        assert_eq!(decoded.payload, envelope.payload);
        assert_eq!(decoded.metadata.aggregate_id(), "l-1");
        assert_eq!(decoded.metadata.occurred_at(), envelope.metadata.occurred_at());
        assert_eq!(decoded.context.correlation_id(), Some("corr-1"));

        let mut lamp = Lamp::default();
        lamp.apply(&decoded.payload);
        assert!(lamp.on);
    }

    #[test]
    fn decode_rejects_foreign_records() {
        let record = codec().encode(&switched_on("l-1")).unwrap();
        let err = codec()
            .decode_for::<Lamp>(&"l-2".to_string(), &record)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let alien = EventRecord::builder()
            .id("e-1")
            .event_type("exploded")
            .source("randomtalk.home")
            .subject(Subject::parse("randomtalk.home.lamps.l-1.exploded").unwrap())
            .data_schema("x")
            .aggregate_version(Version::from_value(1))
            .payload(b"{}".to_vec())
            .build();
        assert!(matches!(
            codec().decode::<Lamp>(&alien),
            Err(DomainError::TypeMismatch { .. })
        ));
    }
}
