//! 写入重试策略
//!
//! 固定次数、固定间隔，只对瞬时故障生效；冲突类错误直接返回，绝不盲目重试。
//!
use super::journal::JournalError;
use bon::Builder;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// 总尝试次数（含首次），至少为 1
    #[builder(default = 3)]
    pub max_attempts: u32,
    /// 两次尝试之间的固定等待
    #[builder(default = Duration::from_millis(200))]
    #[serde(rename = "wait_ms", with = "millis")]
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetryPolicy {
    /// 不重试
    pub fn none() -> Self {
        Self::builder().max_attempts(1).build()
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, JournalError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, JournalError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match f().await {
                Err(err) if err.is_transient() && attempt < attempts => {
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        "journal operation failed, retrying"
                    );
                    tokio::time::sleep(self.wait).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
