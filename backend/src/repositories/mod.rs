//! Persistence gateway. Each table sits behind a trait so the reconcilers and
//! handlers can run against in-memory stores in tests.

use sqlx::PgPool;
use std::sync::Arc;

pub mod bill;
pub mod common;
pub mod group;
pub mod robot;
pub mod session;

pub use bill::{BillRepository, PgBillRepository};
pub use group::{GroupRepository, PgGroupRepository};
pub use robot::{PgRobotRepository, RobotRepository};
pub use session::{PgSessionRepository, SessionRepository};

/// All repositories, shared by handlers and background jobs.
#[derive(Clone)]
pub struct Repositories {
    pub robots: Arc<dyn RobotRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub bills: Arc<dyn BillRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            robots: Arc::new(PgRobotRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            groups: Arc::new(PgGroupRepository::new(pool.clone())),
            bills: Arc::new(PgBillRepository::new(pool)),
        }
    }
}
