//! First group import for sessions that just logged in.

use async_trait::async_trait;

use crate::models::session::UserSession;
use crate::scheduler::{
    settle, ItemError, ItemOutcome, JobContext, JobError, ReconcileJob, TickReport,
};
use crate::services::robot_api::RemoteGroup;

pub struct InitializationJob {
    ctx: JobContext,
}

impl InitializationJob {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    async fn reconcile(&self, session: &UserSession) -> Result<ItemOutcome, ItemError> {
        let robot = self.ctx.robot_for(session).await?;
        let ready = self
            .ctx
            .api
            .get_init_status(&robot.address, &session.token)
            .await?;

        if !ready {
            let existing = self.ctx.repos.groups.count_by_wx_id(&session.wx_id).await?;
            if existing > 0 {
                tracing::debug!(
                    session_id = %session.id,
                    wx_id = %session.wx_id,
                    existing,
                    "Groups already present, awaiting upstream init confirmation"
                );
                return Ok(ItemOutcome::Skipped);
            }
            return Ok(ItemOutcome::Unchanged);
        }

        let groups = self
            .ctx
            .api
            .get_group_list(&robot.address, &session.token)
            .await?;
        let imported = import_groups(&self.ctx, &session.wx_id, &groups).await?;
        self.ctx.repos.sessions.mark_initialized(session.id).await?;

        tracing::info!(
            session_id = %session.id,
            wx_id = %session.wx_id,
            imported,
            "Session initialized"
        );
        Ok(ItemOutcome::Updated)
    }
}

/// Upserts every listed group with a non-empty id; returns how many were written.
pub(crate) async fn import_groups(
    ctx: &JobContext,
    wx_id: &str,
    groups: &[RemoteGroup],
) -> Result<usize, ItemError> {
    let mut written = 0;
    for group in groups.iter().filter(|g| !g.group_id.is_empty()) {
        ctx.repos
            .groups
            .save_or_update(wx_id, &group.group_id, &group.nick_name)
            .await?;
        written += 1;
    }
    Ok(written)
}

#[async_trait]
impl ReconcileJob for InitializationJob {
    fn name(&self) -> &'static str {
        "initialization"
    }

    async fn run_tick(&self) -> Result<TickReport, JobError> {
        let sessions = self.ctx.repos.sessions.list_uninitialized().await?;
        let mut report = TickReport::default();
        for session in &sessions {
            let result = self.reconcile(session).await;
            report.record(settle(self.name(), session, result));
        }
        Ok(report)
    }
}
