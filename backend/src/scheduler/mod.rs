//! Periodic reconciliation of session and group state against the robot API.
//!
//! Each job runs on its own tokio task. A tick loads its intake set, processes
//! the sessions one at a time and tallies the outcome. A failure on one session
//! never aborts the tick; only a failed intake query does.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::models::{robot::RobotConfig, session::UserSession};
use crate::repositories::Repositories;
use crate::services::robot_api::{ApiError, RobotApi};
use crate::types::RobotId;

pub mod group_sync;
pub mod initialization;
pub mod login_status;

pub use group_sync::GroupSyncJob;
pub use initialization::InitializationJob;
pub use login_status::LoginStatusJob;

/// Result of reconciling a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// State was written.
    Updated,
    /// Checked and found nothing to do.
    Unchanged,
    /// Deliberately left alone this tick.
    Skipped,
    Failed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub total: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TickReport {
    pub fn record(&mut self, outcome: ItemOutcome) {
        self.total += 1;
        match outcome {
            ItemOutcome::Updated => self.updated += 1,
            ItemOutcome::Unchanged => self.unchanged += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.updated + self.unchanged
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to load intake sessions: {0}")]
    Intake(#[from] sqlx::Error),
}

/// Why one session could not be reconciled.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("robot {0} not found")]
    MissingRobot(RobotId),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[async_trait]
pub trait ReconcileJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run_tick(&self) -> Result<TickReport, JobError>;
}

/// Dependencies shared by every job.
#[derive(Clone)]
pub struct JobContext {
    pub repos: Repositories,
    pub api: Arc<dyn RobotApi>,
}

impl JobContext {
    pub fn new(repos: Repositories, api: Arc<dyn RobotApi>) -> Self {
        Self { repos, api }
    }

    pub(crate) async fn robot_for(&self, session: &UserSession) -> Result<RobotConfig, ItemError> {
        self.repos
            .robots
            .find(session.robot_id)
            .await?
            .ok_or(ItemError::MissingRobot(session.robot_id))
    }
}

/// Folds a per-session result into an outcome, logging failures with the
/// session's identity.
pub(crate) fn settle(
    job: &'static str,
    session: &UserSession,
    result: Result<ItemOutcome, ItemError>,
) -> ItemOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!(
                job,
                session_id = %session.id,
                wx_id = %session.wx_id,
                error = %err,
                "Failed to reconcile session"
            );
            ItemOutcome::Failed
        }
    }
}

/// Handle to a running job task.
pub struct JobHandle {
    name: &'static str,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl JobHandle {
    /// Stops scheduling new ticks and waits for the in-flight tick to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            tracing::error!(job = self.name, error = %err, "Job task ended abnormally");
        }
        tracing::info!(job = self.name, "Job stopped");
    }
}

/// Time from `now` until the next multiple of `period` since the Unix epoch.
pub fn delay_until_next_boundary(now: Duration, period: Duration) -> Duration {
    let period_ms = period.as_millis().max(1);
    let remainder = now.as_millis() % period_ms;
    if remainder == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis((period_ms - remainder) as u64)
    }
}

/// Spawns `job` on a fixed period aligned to wall-clock boundaries.
///
/// Ticks never overlap: a tick that overruns its period swallows the missed
/// ticks instead of queueing them.
pub fn spawn_job(job: Arc<dyn ReconcileJob>, period: Duration) -> JobHandle {
    let name = job.name();
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let first = Instant::now() + delay_until_next_boundary(since_epoch, period);
        let mut interval = tokio::time::interval_at(first, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(job = name, period_secs = period.as_secs(), "Job scheduled");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }
            run_once(job.as_ref()).await;
        }
    });

    JobHandle { name, cancel, task }
}

async fn run_once(job: &dyn ReconcileJob) {
    let started = Instant::now();
    match job.run_tick().await {
        Ok(report) if report.total == 0 => {
            tracing::debug!(job = job.name(), "Nothing to reconcile");
        }
        Ok(report) => {
            tracing::info!(
                job = job.name(),
                total = report.total,
                succeeded = report.succeeded(),
                updated = report.updated,
                skipped = report.skipped,
                failed = report.failed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Tick finished"
            );
        }
        Err(err) => {
            tracing::error!(job = job.name(), error = %err, "Tick failed");
        }
    }
}

/// The three reconcilers, started together and stopped together.
pub struct Schedulers {
    handles: Vec<JobHandle>,
}

impl Schedulers {
    pub fn start(ctx: JobContext, config: &SchedulerConfig) -> Self {
        if !config.enabled {
            tracing::info!("Schedulers disabled by configuration");
            return Self { handles: vec![] };
        }

        let handles = vec![
            spawn_job(
                Arc::new(InitializationJob::new(ctx.clone())),
                config.initialization_period,
            ),
            spawn_job(
                Arc::new(GroupSyncJob::new(ctx.clone())),
                config.group_sync_period,
            ),
            spawn_job(Arc::new(LoginStatusJob::new(ctx)), config.login_status_period),
        ];
        Self { handles }
    }

    pub async fn shutdown(self) {
        for handle in self.handles {
            handle.stop().await;
        }
    }
}
