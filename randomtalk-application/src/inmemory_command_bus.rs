use crate::{
    command::Command, command_bus::CommandBus, command_handler::CommandHandler,
    context::AppContext, error::AppError,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId, type_name};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxAnySend = Box<dyn Any + Send>;

type CmdHandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<BoxAnySend, AppError>> + Send + 'a>>;

type CmdHandlerFn =
    Arc<dyn for<'a> Fn(BoxAnySend, &'a AppContext) -> CmdHandlerFuture<'a> + Send + Sync>;

/// 基于内存的 CommandBus 实现
/// - 通过 TypeId 注册不同 Command 对应的 Handler，每个命令只允许一个处理器
/// - 运行时以类型擦除（Any）方式调度，调用端还原 `C::Output`
pub struct InMemoryCommandBus {
    handlers: DashMap<TypeId, (&'static str, CmdHandlerFn)>,
}

impl Default for InMemoryCommandBus {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}

impl InMemoryCommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令处理器；重复注册返回 `AlreadyRegisteredCommand`
    pub fn register<C, H>(&self, handler: Arc<H>) -> Result<(), AppError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let f: CmdHandlerFn = Arc::new(move |boxed_cmd, ctx| {
            let handler = handler.clone();

            Box::pin(async move {
                // 键与闭包同属泛型 C，downcast 只会在手工插入错误条目时失败
                match boxed_cmd.downcast::<C>() {
                    Ok(cmd) => {
                        let out = handler.handle(ctx, *cmd).await?;
                        Ok(Box::new(out) as BoxAnySend)
                    }
                    Err(_) => Err(AppError::TypeMismatch {
                        expected: C::NAME,
                        found: "unknown",
                    }),
                }
            })
        });

        match self.handlers.entry(TypeId::of::<C>()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegisteredCommand { command: C::NAME }),
            Entry::Vacant(slot) => {
                slot.insert((C::NAME, f));
                Ok(())
            }
        }
    }

    /// 已注册的命令名（只读视图）
    pub fn registered_commands(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|e| e.value().0).collect()
    }
}

#[async_trait]
impl CommandBus for InMemoryCommandBus {
    async fn dispatch<C: Command>(&self, ctx: &AppContext, cmd: C) -> Result<C::Output, AppError> {
        let Some(f) = self.handlers.get(&TypeId::of::<C>()).map(|h| h.1.clone()) else {
            return Err(AppError::HandlerNotFound(C::NAME));
        };

        tracing::debug!(command = C::NAME, "dispatching command");
        let out = (f)(Box::new(cmd), ctx).await?;

        match out.downcast::<C::Output>() {
            Ok(out) => Ok(*out),
            Err(_) => Err(AppError::TypeMismatch {
                expected: type_name::<C::Output>(),
                found: "unknown",
            }),
        }
    }
}
