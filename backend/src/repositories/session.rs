//! Session repository: the `wx_user_logins` table and the message-bot
//! candidate join.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::session::{BotCandidate, SessionDraft, SessionStatus, UserSession};
use crate::types::{RobotId, SessionId};

const TABLE_NAME: &str = "wx_user_logins";
const SELECT_COLUMNS: &str = "id, robot_id, token, wx_id, nick_name, extension_time, \
     expiration_time, has_security_risk, status, is_initialized, is_message_bot, \
     create_time, update_time";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Upserts on `(robot_id, wx_id)`. An existing row keeps its `id` and
    /// `create_time`; every other column is overwritten.
    async fn save(&self, draft: &SessionDraft) -> sqlx::Result<UserSession>;

    async fn find(&self, id: SessionId) -> sqlx::Result<Option<UserSession>>;

    async fn list_by_robot(&self, robot_id: RobotId) -> sqlx::Result<Vec<UserSession>>;

    /// Removes the session only; its groups stay until the next sync.
    async fn delete(&self, id: SessionId) -> sqlx::Result<bool>;

    async fn update_status(&self, id: SessionId, status: SessionStatus) -> sqlx::Result<bool>;

    async fn mark_initialized(&self, id: SessionId) -> sqlx::Result<bool>;

    async fn update_message_bot(&self, id: SessionId, is_message_bot: bool)
        -> sqlx::Result<bool>;

    /// Sets both extension and expiration time for the session that owns `token`.
    async fn update_extension(
        &self,
        robot_id: RobotId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> sqlx::Result<u64>;

    /// Normal sessions still waiting for their first group import.
    async fn list_uninitialized(&self) -> sqlx::Result<Vec<UserSession>>;

    /// Normal sessions whose groups are kept in sync.
    async fn list_initialized(&self) -> sqlx::Result<Vec<UserSession>>;

    async fn list_normal(&self) -> sqlx::Result<Vec<UserSession>>;

    /// Eligible senders for `group_id`, ordered by session id.
    async fn find_message_bot_candidates(&self, group_id: &str)
        -> sqlx::Result<Vec<BotCandidate>>;
}

#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(&self, clause: &str) -> sqlx::Result<Vec<UserSession>> {
        let query = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY id ASC",
            SELECT_COLUMNS, TABLE_NAME, clause
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(SessionStatus::Normal)
            .fetch_all(&self.pool)
            .await
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn save(&self, draft: &SessionDraft) -> sqlx::Result<UserSession> {
        let query = format!(
            "INSERT INTO {table} (robot_id, token, wx_id, nick_name, extension_time, \
             expiration_time, has_security_risk, status, is_initialized, is_message_bot) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (robot_id, wx_id) DO UPDATE SET \
             token = EXCLUDED.token, nick_name = EXCLUDED.nick_name, \
             extension_time = EXCLUDED.extension_time, \
             expiration_time = EXCLUDED.expiration_time, \
             has_security_risk = EXCLUDED.has_security_risk, status = EXCLUDED.status, \
             is_initialized = EXCLUDED.is_initialized, \
             is_message_bot = EXCLUDED.is_message_bot, update_time = NOW() \
             RETURNING {columns}",
            table = TABLE_NAME,
            columns = SELECT_COLUMNS
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(draft.robot_id)
            .bind(&draft.token)
            .bind(&draft.wx_id)
            .bind(&draft.nick_name)
            .bind(draft.extension_time)
            .bind(draft.expiration_time)
            .bind(draft.has_security_risk)
            .bind(draft.status)
            .bind(draft.is_initialized)
            .bind(draft.is_message_bot)
            .fetch_one(&self.pool)
            .await
    }

    async fn find(&self, id: SessionId) -> sqlx::Result<Option<UserSession>> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        sqlx::query_as::<_, UserSession>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_by_robot(&self, robot_id: RobotId) -> sqlx::Result<Vec<UserSession>> {
        let query = format!(
            "SELECT {} FROM {} WHERE robot_id = $1 ORDER BY id ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(robot_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn delete(&self, id: SessionId) -> sqlx::Result<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", TABLE_NAME);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_status(&self, id: SessionId, status: SessionStatus) -> sqlx::Result<bool> {
        let query = format!(
            "UPDATE {} SET status = $2, update_time = NOW() WHERE id = $1",
            TABLE_NAME
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_initialized(&self, id: SessionId) -> sqlx::Result<bool> {
        let query = format!(
            "UPDATE {} SET is_initialized = TRUE, update_time = NOW() WHERE id = $1",
            TABLE_NAME
        );
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_message_bot(
        &self,
        id: SessionId,
        is_message_bot: bool,
    ) -> sqlx::Result<bool> {
        let query = format!(
            "UPDATE {} SET is_message_bot = $2, update_time = NOW() WHERE id = $1",
            TABLE_NAME
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(is_message_bot)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_extension(
        &self,
        robot_id: RobotId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> sqlx::Result<u64> {
        let query = format!(
            "UPDATE {} SET extension_time = $3, expiration_time = $3, update_time = NOW() \
             WHERE robot_id = $1 AND token = $2",
            TABLE_NAME
        );
        let result = sqlx::query(&query)
            .bind(robot_id)
            .bind(token)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_uninitialized(&self) -> sqlx::Result<Vec<UserSession>> {
        self.list_where("is_initialized = FALSE AND status = $1").await
    }

    async fn list_initialized(&self) -> sqlx::Result<Vec<UserSession>> {
        self.list_where("is_initialized = TRUE AND status = $1").await
    }

    async fn list_normal(&self) -> sqlx::Result<Vec<UserSession>> {
        self.list_where("status = $1").await
    }

    async fn find_message_bot_candidates(
        &self,
        group_id: &str,
    ) -> sqlx::Result<Vec<BotCandidate>> {
        sqlx::query_as::<_, BotCandidate>(
            "SELECT u.id AS session_id, u.robot_id, u.token, u.wx_id, u.nick_name, \
             r.address AS robot_address \
             FROM wx_user_logins u \
             JOIN wx_groups g ON g.wx_id = u.wx_id \
             JOIN wx_robot_configs r ON r.id = u.robot_id \
             WHERE g.group_id = $1 AND u.status = $2 \
             AND u.is_message_bot = TRUE AND u.has_security_risk = FALSE \
             ORDER BY u.id ASC",
        )
        .bind(group_id)
        .bind(SessionStatus::Normal)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_select_columns_include_state_flags() {
        for column in ["status", "is_initialized", "is_message_bot", "has_security_risk"] {
            assert!(SELECT_COLUMNS.contains(column), "missing {column}");
        }
    }

    #[test]
    fn mock_session_repository_is_send_sync() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<MockSessionRepository>();
    }
}
