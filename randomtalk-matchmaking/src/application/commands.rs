//! 写路径：匹配请求命令
use super::dto::MatchRequestOutcome;
use crate::domain::gender::Gender;
use crate::domain::preferences::{MAX_ALLOWED_AGE, MIN_ALLOWED_AGE, Preferences};
use crate::domain::processor::MatchmakingProcessor;
use crate::domain::user::User;
use async_trait::async_trait;
use randomtalk_application::command::Command;
use randomtalk_application::command_handler::CommandHandler;
use randomtalk_application::context::AppContext;
use randomtalk_application::error::AppError;
use serde::Deserialize;
use std::sync::Arc;

/// 以给定偏好为用户请求一次匹配
#[derive(Debug, Clone, Deserialize)]
pub struct MatchUserWithPreferences {
    pub user_id: String,
    pub user_age: u32,
    #[serde(default)]
    pub user_gender: Gender,
    #[serde(default, rename = "user_match_preferences")]
    pub user_preferences: Preferences,
}

impl Command for MatchUserWithPreferences {
    const NAME: &'static str = "matchmaking.match_user_with_preferences";
    type Output = MatchRequestOutcome;
}

impl MatchUserWithPreferences {
    fn validate(&self) -> Result<(), AppError> {
        if self.user_id.trim().is_empty() {
            return Err(AppError::Validation("user id is required".into()));
        }
        if !(MIN_ALLOWED_AGE..=MAX_ALLOWED_AGE).contains(&self.user_age) {
            return Err(AppError::Validation(format!(
                "user age {} is outside {MIN_ALLOWED_AGE}..={MAX_ALLOWED_AGE}",
                self.user_age
            )));
        }
        Ok(())
    }
}

pub struct MatchUserWithPreferencesHandler {
    processor: Arc<dyn MatchmakingProcessor>,
}

impl MatchUserWithPreferencesHandler {
    pub fn new(processor: Arc<dyn MatchmakingProcessor>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl CommandHandler<MatchUserWithPreferences> for MatchUserWithPreferencesHandler {
    async fn handle(
        &self,
        ctx: &AppContext,
        cmd: MatchUserWithPreferences,
    ) -> Result<MatchRequestOutcome, AppError> {
        cmd.validate()?;
        tracing::debug!(
            user_id = %cmd.user_id,
            user_age = cmd.user_age,
            user_preferences = %cmd.user_preferences,
            "match user command received"
        );

        let user = User::new(cmd.user_id, cmd.user_age, cmd.user_gender, cmd.user_preferences);
        let outcome = self
            .processor
            .process_match_request(user, &ctx.biz, &ctx.cancellation)
            .await?;
        Ok(outcome.into())
    }
}
