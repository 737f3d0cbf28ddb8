//! 事件日志中的持久化事件（EventRecord）
//!
//! 一经追加不可修改、不可删除。同一主题内的追加顺序即唯一有效的重放顺序。
//!
use super::subject::Subject;
use crate::error::DomainResult;
use crate::value_object::Version;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct EventRecord {
    /// 事件唯一标识，同时作为写入时的去重键
    #[builder(into)]
    id: String,
    /// 事件类型（如 `match_created`）
    #[builder(into)]
    event_type: String,
    /// 事件来源（如 `randomtalk.matchmaking`）
    #[builder(into)]
    source: String,
    /// 层级主题，编码聚合标识与事件类型
    subject: Subject,
    /// 事件发生时间
    #[builder(default = Utc::now())]
    time: DateTime<Utc>,
    /// 载荷 schema 标识
    #[builder(into)]
    data_schema: String,
    /// 扩展元数据：写入时的聚合版本
    aggregate_version: Version,
    /// JSON 编码的事件载荷
    payload: Vec<u8>,
    /// 扩展元数据：关联ID
    #[builder(into)]
    correlation_id: Option<String>,
    /// 扩展元数据：因果ID
    #[builder(into)]
    causation_id: Option<String>,
    /// 事件日志分配的序号，追加成功后才有值
    sequence: Option<u64>,
}

impl EventRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn data_schema(&self) -> &str {
        &self.data_schema
    }

    pub fn aggregate_version(&self) -> Version {
        self.aggregate_version
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// 反序列化载荷
    pub fn decode_payload<T: DeserializeOwned>(&self) -> DomainResult<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// 由日志实现在追加成功时调用
    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_defaults_and_payload_decoding() {
        let payload = serde_json::to_vec(&json!({ "match_id": "m-1" })).unwrap();
        let record = EventRecord::builder()
            .id("evt-1")
            .event_type("match_created")
            .source("randomtalk.matchmaking")
            .subject(Subject::parse("randomtalk.matchmaking.matches.m-1.match_created").unwrap())
            .data_schema("schemas.randomtalk.com/matchmaking/match/events/match_created/1")
            .aggregate_version(Version::from_value(1))
            .payload(payload)
            .build();

        assert!(record.sequence().is_none());
        assert!(record.correlation_id().is_none());
        assert_eq!(record.subject().aggregate_id(), Some("m-1"));

        let value: serde_json::Value = record.decode_payload().unwrap();
        assert_eq!(value["match_id"], "m-1");

        let stored = record.with_sequence(7);
        assert_eq!(stored.sequence(), Some(7));
    }
}
