use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 事件元数据：归属的聚合与发生时间
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[builder(into)]
    aggregate_id: String,
    #[builder(into)]
    aggregate_type: String,
    #[builder(default = Utc::now())]
    occurred_at: DateTime<Utc>,
    /// 事件日志分配的序号，尚未持久化时为空
    sequence: Option<u64>,
}

impl Metadata {
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }
}
