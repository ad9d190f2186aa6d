//! Keeps stored groups equal to what the robot reports for initialized sessions.
//! This is the only path that deletes groups.

use async_trait::async_trait;

use crate::models::session::UserSession;
use crate::scheduler::initialization::import_groups;
use crate::scheduler::{
    settle, ItemError, ItemOutcome, JobContext, JobError, ReconcileJob, TickReport,
};
use crate::services::robot_api::ApiError;

pub struct GroupSyncJob {
    ctx: JobContext,
}

impl GroupSyncJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    async fn reconcile(&self, session: &UserSession) -> Result<ItemOutcome, ItemError> {
        let robot = self.ctx.robot_for(session).await?;
        let groups = match self
            .ctx
            .api
            .get_group_list(&robot.address, &session.token)
            .await
        {
            Ok(groups) => groups,
            Err(ApiError::Application { code, text, .. }) => {
                // Upstream answered but refused; try again next tick.
                tracing::warn!(
                    session_id = %session.id,
                    wx_id = %session.wx_id,
                    code,
                    text = %text,
                    "Group list unavailable, skipping sync"
                );
                return Ok(ItemOutcome::Skipped);
            }
            Err(err) => return Err(err.into()),
        };

        import_groups(&self.ctx, &session.wx_id, &groups).await?;

        let keep: Vec<String> = groups
            .into_iter()
            .map(|g| g.group_id)
            .filter(|id| !id.is_empty())
            .collect();
        let removed = self
            .ctx
            .repos
            .groups
            .delete_not_in(&session.wx_id, &keep)
            .await?;

        tracing::debug!(
            session_id = %session.id,
            wx_id = %session.wx_id,
            listed = keep.len(),
            removed,
            "Groups synchronized"
        );
        Ok(ItemOutcome::Updated)
    }
}

#[async_trait]
impl ReconcileJob for GroupSyncJob {
    fn name(&self) -> &'static str {
        "group_sync"
    }

    async fn run_tick(&self) -> Result<TickReport, JobError> {
        let sessions = self.ctx.repos.sessions.list_initialized().await?;
        let mut report = TickReport::default();
        for session in &sessions {
            let result = self.reconcile(session).await;
            report.record(settle(self.name(), session, result));
        }
        Ok(report)
    }
}
