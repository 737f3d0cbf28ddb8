//! 日志初始化
use crate::config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 安装全局订阅器；`RUST_LOG` 优先于配置中的级别。
///
/// 已经安装过时返回 `false`，便于测试与嵌入场景重复调用。
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
    installed.is_ok()
}
