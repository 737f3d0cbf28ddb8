//! 服务配置
//!
//! 默认值可直接运行；`from_env` 先加载可选的 `.env`，再用带
//! `RANDOMTALK_MATCHMAKING_` 前缀的环境变量逐项覆盖，例如
//! `RANDOMTALK_MATCHMAKING_LOGGING_LEVEL=debug`、
//! `RANDOMTALK_MATCHMAKING_PERSISTENCE_RETRY_MAX_ATTEMPTS=5`。
//!
use randomtalk_domain::event_log::RetryPolicy;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_PREFIX: &str = "RANDOMTALK_MATCHMAKING_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `RUST_LOG` 未设置时使用的过滤指令
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

/// 目前只有内存日志一种存储引擎
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceEngine {
    #[default]
    Memory,
}

impl FromStr for PersistenceEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            other => Err(format!("unsupported persistence engine {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_wait_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_wait_ms: 10_000,
        }
    }
}

impl FetchConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub engine: PersistenceEngine,
    pub stream_name: String,
    pub retry: RetryPolicy,
    pub fetch: FetchConfig,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            engine: PersistenceEngine::Memory,
            stream_name: "randomtalk_matchmaking".into(),
            retry: RetryPolicy::default(),
            fetch: FetchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// 广播缓冲区容量
    pub capacity: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    pub concurrency: usize,
    pub enabled: bool,
    /// 失败请求的重投：总处理次数与两轮之间的等待
    pub redelivery: RetryPolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            enabled: true,
            redelivery: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    pub service_name: String,
    pub environment: Environment,
    pub logging: LoggingConfig,
    pub persistence: PersistenceConfig,
    pub notifications: NotificationsConfig,
    pub consumer: ConsumerConfig,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            service_name: "randomtalk-matchmaking".into(),
            environment: Environment::default(),
            logging: LoggingConfig::default(),
            persistence: PersistenceConfig::default(),
            notifications: NotificationsConfig::default(),
            consumer: ConsumerConfig::default(),
        }
    }
}

impl MatchmakingConfig {
    /// 从进程环境加载（开发环境下会先读取 `.env`）
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` 接收完整变量名（含前缀）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let mut config = Self::default();

        vars.set("SERVICE_NAME", &mut config.service_name)?;
        vars.set("ENVIRONMENT", &mut config.environment)?;
        vars.set("LOGGING_LEVEL", &mut config.logging.level)?;
        vars.set("LOGGING_JSON", &mut config.logging.json)?;

        let persistence = &mut config.persistence;
        vars.set("PERSISTENCE_ENGINE", &mut persistence.engine)?;
        vars.set("PERSISTENCE_STREAM_NAME", &mut persistence.stream_name)?;
        vars.set("PERSISTENCE_RETRY_MAX_ATTEMPTS", &mut persistence.retry.max_attempts)?;
        let mut wait_ms = persistence.retry.wait.as_millis() as u64;
        vars.set("PERSISTENCE_RETRY_WAIT_MS", &mut wait_ms)?;
        persistence.retry.wait = Duration::from_millis(wait_ms);
        vars.set("PERSISTENCE_FETCH_MAX_WAIT_MS", &mut persistence.fetch.max_wait_ms)?;

        vars.set("NOTIFICATIONS_CAPACITY", &mut config.notifications.capacity)?;
        vars.set("CONSUMER_CONCURRENCY", &mut config.consumer.concurrency)?;
        vars.set("CONSUMER_ENABLED", &mut config.consumer.enabled)?;
        let redelivery = &mut config.consumer.redelivery;
        vars.set("CONSUMER_REDELIVERY_MAX_ATTEMPTS", &mut redelivery.max_attempts)?;
        let mut wait_ms = redelivery.wait.as_millis() as u64;
        vars.set("CONSUMER_REDELIVERY_WAIT_MS", &mut wait_ms)?;
        redelivery.wait = Duration::from_millis(wait_ms);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("PERSISTENCE_RETRY_MAX_ATTEMPTS", self.persistence.retry.max_attempts as usize),
            ("NOTIFICATIONS_CAPACITY", self.notifications.capacity),
            ("CONSUMER_CONCURRENCY", self.consumer.concurrency),
            (
                "CONSUMER_REDELIVERY_MAX_ATTEMPTS",
                self.consumer.redelivery.max_attempts as usize,
            ),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    var: format!("{ENV_PREFIX}{key}"),
                    value: value.to_string(),
                    reason: "must be greater than zero".into(),
                });
            }
        }
        if self.persistence.stream_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: format!("{ENV_PREFIX}PERSISTENCE_STREAM_NAME"),
                value: self.persistence.stream_name.clone(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 变量存在时解析并覆盖 `slot`
    fn set<T>(&self, key: &str, slot: &mut T) -> Result<(), ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let var = format!("{ENV_PREFIX}{key}");
        let Some(raw) = (self.lookup)(&var) else {
            return Ok(());
        };
        *slot = raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: err.to_string(),
        })?;
        Ok(())
    }
}
