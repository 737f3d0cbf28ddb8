use randomtalk_domain::domain_event::BusinessContext;
use tokio_util::sync::CancellationToken;

/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用（命令/查询）所需的横切信息：
/// - 业务语境（`BusinessContext`）：`correlation_id`、`causation_id`、执行者 ID；
/// - 幂等键（`idempotency_key`）：由传输层提供，基础设施据此做重复提交保护；
/// - 取消信号（`cancellation`）：覆盖整条同步请求路径，已完成的副作用不做补偿。
///
/// ```rust
/// use randomtalk_application::context::AppContext;
/// use randomtalk_domain::domain_event::BusinessContext;
///
/// let ctx = AppContext::default()
///     .with_biz(BusinessContext::builder().correlation_id("cor-123").build())
///     .with_idempotency_key("idem-xyz");
/// assert!(!ctx.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub biz: BusinessContext,
    pub idempotency_key: Option<String>,
    pub cancellation: CancellationToken,
}

impl AppContext {
    pub fn with_biz(mut self, biz: BusinessContext) -> Self {
        self.biz = biz;
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// 绑定到外部取消信号（通常为服务关闭令牌的子令牌）
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
