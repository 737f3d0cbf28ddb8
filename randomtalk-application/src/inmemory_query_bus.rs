use crate::{
    context::AppContext, error::AppError, query::Query, query_bus::QueryBus,
    query_handler::QueryHandler,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId, type_name, type_name_of_val};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxAnySend = Box<dyn Any + Send>;

type QueryHandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<BoxAnySend, AppError>> + Send + 'a>>;

type QueryHandlerFn =
    Arc<dyn for<'a> Fn(BoxAnySend, &'a AppContext) -> QueryHandlerFuture<'a> + Send + Sync>;

/// 基于内存的 QueryBus 实现
/// - 通过 TypeId 注册不同 Query 对应的 Handler
/// - 以类型擦除方式调度，并在调用端还原 `Q::Dto`
pub struct InMemoryQueryBus {
    handlers: DashMap<TypeId, (&'static str, QueryHandlerFn)>,
}

impl Default for InMemoryQueryBus {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}

impl InMemoryQueryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册查询处理器；重复注册返回 `AlreadyRegisteredQuery`
    pub fn register<Q, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        let f: QueryHandlerFn = Arc::new(move |boxed_q, ctx| {
            let handler = handler.clone();

            Box::pin(async move {
                match boxed_q.downcast::<Q>() {
                    Ok(q) => {
                        let dto = handler.handle(ctx, *q).await?;
                        Ok(Box::new(dto) as BoxAnySend)
                    }
                    Err(e) => Err(AppError::TypeMismatch {
                        expected: type_name::<Q>(),
                        found: type_name_of_val(&e),
                    }),
                }
            })
        });

        match self.handlers.entry(TypeId::of::<Q>()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegisteredQuery {
                query: Q::NAME,
                result: type_name::<Q::Dto>(),
            }),
            Entry::Vacant(slot) => {
                slot.insert((Q::NAME, f));
                Ok(())
            }
        }
    }

    /// 已注册的查询名（只读视图）
    pub fn registered_queries(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|e| e.value().0).collect()
    }
}

#[async_trait]
impl QueryBus for InMemoryQueryBus {
    async fn dispatch<Q: Query>(&self, ctx: &AppContext, q: Q) -> Result<Q::Dto, AppError> {
        let Some(f) = self.handlers.get(&TypeId::of::<Q>()).map(|h| h.1.clone()) else {
            return Err(AppError::HandlerNotFound(Q::NAME));
        };

        let out = (f)(Box::new(q), ctx).await?;

        match out.downcast::<Q::Dto>() {
            Ok(dto) => Ok(*dto),
            Err(e) => Err(AppError::TypeMismatch {
                expected: type_name::<Q::Dto>(),
                found: type_name_of_val(&e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::Dto;
    use serde::Serialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::task::JoinSet;

    #[derive(Debug)]
    struct CountWaiting;

    #[derive(Debug, Serialize)]
    struct CountDto(pub usize);

    impl Dto for CountDto {}

    impl Query for CountWaiting {
        const NAME: &'static str = "test.count_waiting";
        type Dto = CountDto;
    }

    struct CountHandler {
        counter: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl QueryHandler<CountWaiting> for CountHandler {
        async fn handle(&self, _ctx: &AppContext, _q: CountWaiting) -> Result<CountDto, AppError> {
            let v = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(CountDto(v))
        }
    }

    fn handler() -> Arc<CountHandler> {
        Arc::new(CountHandler {
            counter: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn register_and_dispatch_works() {
        let bus = InMemoryQueryBus::new();
        bus.register::<CountWaiting, _>(handler()).unwrap();

        let ctx = AppContext::default();
        let CountDto(n) = bus.dispatch(&ctx, CountWaiting).await.unwrap();
        assert_eq!(n, 1);
        assert_eq!(bus.registered_queries(), vec!["test.count_waiting"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn not_found_error_when_unregistered() {
        let bus = InMemoryQueryBus::new();
        let err = bus
            .dispatch(&AppContext::default(), CountWaiting)
            .await
            .unwrap_err();
        match err {
            AppError::HandlerNotFound(name) => assert_eq!(name, "test.count_waiting"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn duplicate_registration_is_rejected() {
        let bus = InMemoryQueryBus::new();
        bus.register::<CountWaiting, _>(handler()).unwrap();
        let err = bus.register::<CountWaiting, _>(handler()).unwrap_err();
        match err {
            AppError::AlreadyRegisteredQuery { query, result } => {
                assert_eq!(query, "test.count_waiting");
                assert!(result.contains("CountDto"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Debug, Serialize)]
    struct WrongDto;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn type_mismatch_error_when_result_downcast_fails() {
        let bus = InMemoryQueryBus::new();
        // 手动插入错误条目：键是 CountWaiting，但闭包返回 WrongDto
        let f: QueryHandlerFn = Arc::new(|_boxed_q, _ctx| {
            Box::pin(async move { Ok(Box::new(WrongDto) as BoxAnySend) })
        });
        bus.handlers
            .insert(TypeId::of::<CountWaiting>(), (CountWaiting::NAME, f));

        let err = bus
            .dispatch(&AppContext::default(), CountWaiting)
            .await
            .unwrap_err();
        match err {
            AppError::TypeMismatch { expected, .. } => assert!(expected.contains("CountDto")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_dispatch_is_safe() {
        let bus = Arc::new(InMemoryQueryBus::new());
        bus.register::<CountWaiting, _>(handler()).unwrap();

        let mut set = JoinSet::new();
        let ctx = AppContext::default();
        for _ in 0..100 {
            let bus = bus.clone();
            let ctx = ctx.clone();
            set.spawn(async move { bus.dispatch(&ctx, CountWaiting).await.unwrap() });
        }
        let mut results = Vec::new();
        while let Some(res) = set.join_next().await {
            results.push(res.unwrap().0);
        }
        results.sort_unstable();
        assert_eq!(results.len(), 100);
        assert_eq!(results[0], 1);
        assert_eq!(results[99], 100);
    }
}
