//! Robot endpoint repository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::robot::{join_admin_users, RobotConfig, RobotPayload};
use crate::types::RobotId;

const TABLE_NAME: &str = "wx_robot_configs";
const SELECT_COLUMNS: &str =
    "id, address, admin_key, owner_id, description, admin_users, create_time, update_time";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RobotRepository: Send + Sync {
    async fn list(&self) -> sqlx::Result<Vec<RobotConfig>>;

    async fn find(&self, id: RobotId) -> sqlx::Result<Option<RobotConfig>>;

    async fn create(&self, payload: &RobotPayload) -> sqlx::Result<RobotConfig>;

    /// Overwrites every mutable column; `create_time` is preserved.
    async fn update(&self, id: RobotId, payload: &RobotPayload)
        -> sqlx::Result<Option<RobotConfig>>;

    /// Round-trips a trivial query to prove the store is reachable.
    async fn ping(&self) -> sqlx::Result<()>;
}

#[derive(Debug, Clone)]
pub struct PgRobotRepository {
    pool: PgPool,
}

impl PgRobotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RobotRepository for PgRobotRepository {
    async fn list(&self) -> sqlx::Result<Vec<RobotConfig>> {
        let query = format!("SELECT {} FROM {} ORDER BY id ASC", SELECT_COLUMNS, TABLE_NAME);
        sqlx::query_as::<_, RobotConfig>(&query)
            .fetch_all(&self.pool)
            .await
    }

    async fn find(&self, id: RobotId) -> sqlx::Result<Option<RobotConfig>> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        sqlx::query_as::<_, RobotConfig>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create(&self, payload: &RobotPayload) -> sqlx::Result<RobotConfig> {
        let query = format!(
            "INSERT INTO {} (address, admin_key, owner_id, description, admin_users) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, RobotConfig>(&query)
            .bind(payload.address.trim())
            .bind(&payload.admin_key)
            .bind(payload.owner_id)
            .bind(&payload.description)
            .bind(join_admin_users(&payload.admin_users))
            .fetch_one(&self.pool)
            .await
    }

    async fn update(
        &self,
        id: RobotId,
        payload: &RobotPayload,
    ) -> sqlx::Result<Option<RobotConfig>> {
        let query = format!(
            "UPDATE {} SET address = $2, admin_key = $3, owner_id = $4, description = $5, \
             admin_users = $6, update_time = NOW() \
             WHERE id = $1 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        sqlx::query_as::<_, RobotConfig>(&query)
            .bind(id)
            .bind(payload.address.trim())
            .bind(&payload.admin_key)
            .bind(payload.owner_id)
            .bind(&payload.description)
            .bind(join_admin_users(&payload.admin_users))
            .fetch_optional(&self.pool)
            .await
    }

    async fn ping(&self) -> sqlx::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
