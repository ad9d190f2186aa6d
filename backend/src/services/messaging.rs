//! Outbound group messaging: picks a sender with the active policy and
//! forwards the message through that sender's robot endpoint.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::models::session::BotCandidate;
use crate::repositories::SessionRepository;
use crate::services::message_strategy::{BotSelector, SelectionPolicy, StrategyKind};
use crate::services::robot_api::{
    send_text_and_image, ApiError, RobotApi, SentImage, SentText, TextImageReport,
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no eligible message bot for group {group_id}")]
    NoEligibleBot { group_id: String },
    #[error("failed to load message bot candidates: {0}")]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Process-wide sender selection. Switching the policy replaces it wholesale.
pub struct MessageDispatcher {
    sessions: Arc<dyn SessionRepository>,
    api: Arc<dyn RobotApi>,
    policy: Mutex<SelectionPolicy>,
}

impl MessageDispatcher {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        api: Arc<dyn RobotApi>,
        strategy: StrategyKind,
    ) -> Self {
        Self::with_policy(sessions, api, strategy.build())
    }

    pub fn with_policy(
        sessions: Arc<dyn SessionRepository>,
        api: Arc<dyn RobotApi>,
        policy: SelectionPolicy,
    ) -> Self {
        Self {
            sessions,
            api,
            policy: Mutex::new(policy),
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.policy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .kind()
    }

    pub fn set_strategy(&self, strategy: StrategyKind) {
        let mut guard = self.policy.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = strategy.build();
        tracing::info!(strategy = %strategy, "Message strategy switched");
    }

    /// Picks the sender for `group_id`. The lock is held only for the pick.
    pub async fn pick(&self, group_id: &str) -> Result<BotCandidate, DispatchError> {
        let candidates = self.sessions.find_message_bot_candidates(group_id).await?;
        let picked = {
            let mut policy = self.policy.lock().unwrap_or_else(PoisonError::into_inner);
            policy.select(&candidates).cloned()
        };
        let bot = picked.ok_or_else(|| DispatchError::NoEligibleBot {
            group_id: group_id.to_string(),
        })?;
        tracing::debug!(
            group_id,
            session_id = %bot.session_id,
            wx_id = %bot.wx_id,
            candidates = candidates.len(),
            "Picked message bot"
        );
        Ok(bot)
    }

    pub async fn send_text(&self, group_id: &str, text: &str) -> Result<SentText, DispatchError> {
        let bot = self.pick(group_id).await?;
        let sent = self
            .api
            .send_text(&bot.robot_address, &bot.token, group_id, text)
            .await?;
        Ok(sent)
    }

    pub async fn send_image(
        &self,
        group_id: &str,
        image_base64: &str,
    ) -> Result<SentImage, DispatchError> {
        let bot = self.pick(group_id).await?;
        let sent = self
            .api
            .send_image(&bot.robot_address, &bot.token, group_id, image_base64)
            .await?;
        Ok(sent)
    }

    /// Both parts go out through the same sender.
    pub async fn send_text_and_image(
        &self,
        group_id: &str,
        text: Option<&str>,
        image_base64: Option<&str>,
    ) -> Result<TextImageReport, DispatchError> {
        let bot = self.pick(group_id).await?;
        Ok(send_text_and_image(
            self.api.as_ref(),
            &bot.robot_address,
            &bot.token,
            group_id,
            text,
            image_base64,
        )
        .await)
    }
}
