//! Marks sessions whose upstream login disappeared as needing a relogin.

use async_trait::async_trait;

use crate::models::session::{SessionStatus, UserSession};
use crate::scheduler::{
    settle, ItemError, ItemOutcome, JobContext, JobError, ReconcileJob, TickReport,
};
use crate::services::robot_api::{AliasCheck, ApiError};

pub struct LoginStatusJob {
    ctx: JobContext,
}

impl LoginStatusJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    async fn reconcile(&self, session: &UserSession) -> Result<ItemOutcome, ItemError> {
        let robot = self.ctx.robot_for(session).await?;
        match self
            .ctx
            .api
            .check_can_set_alias(&robot.address, &session.token)
            .await
        {
            Ok(AliasCheck::NeedsRelogin) => {
                self.ctx
                    .repos
                    .sessions
                    .update_status(session.id, SessionStatus::NeedsRelogin)
                    .await?;
                tracing::info!(
                    session_id = %session.id,
                    wx_id = %session.wx_id,
                    "Session needs relogin"
                );
                Ok(ItemOutcome::Updated)
            }
            // The risk flag is owned by the save flow and is not touched here.
            Ok(AliasCheck::Passed(_)) => Ok(ItemOutcome::Unchanged),
            Err(ApiError::Application { code, text, .. }) => {
                tracing::warn!(
                    session_id = %session.id,
                    wx_id = %session.wx_id,
                    code,
                    text = %text,
                    "Unexpected login check code, leaving status as is"
                );
                Ok(ItemOutcome::Unchanged)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl ReconcileJob for LoginStatusJob {
    fn name(&self) -> &'static str {
        "login_status"
    }

    async fn run_tick(&self) -> Result<TickReport, JobError> {
        let sessions = self.ctx.repos.sessions.list_normal().await?;
        let mut report = TickReport::default();
        for session in &sessions {
            let result = self.reconcile(session).await;
            report.record(settle(self.name(), session, result));
        }
        Ok(report)
    }
}
