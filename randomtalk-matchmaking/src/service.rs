//! 服务装配
//!
//! 启动时构建一次全部协作方与总线，之后按引用传给需要的组件。
//! 匹配事件与匹配请求共用一份事件日志，按主题区分。
//!
use crate::application::{
    FindLastMatchByUser, FindMatchById, MatchQueryHandler, MatchUserWithPreferences,
    MatchUserWithPreferencesHandler,
};
use crate::config::{MatchmakingConfig, PersistenceEngine};
use crate::domain::matcher::GaleShapleyMatcher;
use crate::domain::processor::{MatchmakingProcessor, UserMatchProcessor};
use crate::infrastructure::{
    BroadcastNotificationsChannel, ConsumerHandle, EventLogMatchRepository, MatchRequestConsumer,
    MemoryUserStore, UserMatchRequested,
};
use randomtalk_application::error::AppError;
use randomtalk_application::{InMemoryCommandBus, InMemoryQueryBus};
use randomtalk_domain::error::DomainResult;
use randomtalk_domain::event_log::{AppendResult, EventStream, JournalEventStream, MemoryJournal};
use std::sync::Arc;

pub type MatchStream = Arc<JournalEventStream<MemoryJournal>>;

pub struct MatchmakingService {
    config: MatchmakingConfig,
    stream: MatchStream,
    matches: Arc<EventLogMatchRepository<MatchStream>>,
    pool: Arc<MemoryUserStore>,
    notifications: Arc<BroadcastNotificationsChannel>,
    processor: Arc<dyn MatchmakingProcessor>,
    commands: InMemoryCommandBus,
    queries: InMemoryQueryBus,
    consumer: Arc<MatchRequestConsumer>,
}

impl MatchmakingService {
    #[tracing::instrument(skip_all, fields(service = %config.service_name, environment = %config.environment))]
    pub fn build(config: MatchmakingConfig) -> Result<Self, AppError> {
        let persistence = &config.persistence;
        let stream: MatchStream = match persistence.engine {
            PersistenceEngine::Memory => {
                let journal = Arc::new(MemoryJournal::new(persistence.stream_name.clone()));
                Arc::new(
                    JournalEventStream::builder()
                        .journal(journal)
                        .retry(persistence.retry)
                        .fetch_max_wait(persistence.fetch.max_wait())
                        .build(),
                )
            }
        };

        let matches = Arc::new(EventLogMatchRepository::new(stream.clone()));
        let pool = Arc::new(MemoryUserStore::new());
        let notifications = Arc::new(BroadcastNotificationsChannel::new(
            persistence.stream_name.clone(),
            config.notifications.capacity,
        ));
        let processor: Arc<dyn MatchmakingProcessor> = Arc::new(
            UserMatchProcessor::builder()
                .match_repository(matches.clone())
                .user_store(pool.clone())
                .matcher(Arc::new(GaleShapleyMatcher::new()))
                .notifications(notifications.clone())
                .build(),
        );

        let commands = InMemoryCommandBus::new();
        commands.register::<MatchUserWithPreferences, _>(Arc::new(
            MatchUserWithPreferencesHandler::new(processor.clone()),
        ))?;

        let queries = InMemoryQueryBus::new();
        let match_queries = Arc::new(MatchQueryHandler::new(matches.clone()));
        queries.register::<FindMatchById, _>(match_queries.clone())?;
        queries.register::<FindLastMatchByUser, _>(match_queries)?;

        let consumer = Arc::new(
            MatchRequestConsumer::builder()
                .stream(stream.clone())
                .processor(processor.clone())
                .concurrency(config.consumer.concurrency)
                .redelivery(config.consumer.redelivery)
                .build(),
        );

        tracing::info!(stream = %stream.name(), "matchmaking service assembled");
        Ok(Self {
            config,
            stream,
            matches,
            pool,
            notifications,
            processor,
            commands,
            queries,
            consumer,
        })
    }

    /// 消费者被配置为关闭时返回 `None`
    pub fn start_consumer(&self) -> DomainResult<Option<ConsumerHandle>> {
        if !self.config.consumer.enabled {
            tracing::info!("match request consumer disabled");
            return Ok(None);
        }
        self.consumer.clone().start().map(Some)
    }

    /// 以聊天上下文的身份发布一条匹配请求
    pub async fn publish_match_request(
        &self,
        request: &UserMatchRequested,
    ) -> DomainResult<AppendResult> {
        self.stream.append(vec![request.to_record()?]).await
    }

    pub fn config(&self) -> &MatchmakingConfig {
        &self.config
    }

    pub fn commands(&self) -> &InMemoryCommandBus {
        &self.commands
    }

    pub fn queries(&self) -> &InMemoryQueryBus {
        &self.queries
    }

    pub fn processor(&self) -> &Arc<dyn MatchmakingProcessor> {
        &self.processor
    }

    pub fn matches(&self) -> &Arc<EventLogMatchRepository<MatchStream>> {
        &self.matches
    }

    pub fn pool(&self) -> &Arc<MemoryUserStore> {
        &self.pool
    }

    pub fn notifications(&self) -> &Arc<BroadcastNotificationsChannel> {
        &self.notifications
    }

    pub fn stream(&self) -> &MatchStream {
        &self.stream
    }
}
