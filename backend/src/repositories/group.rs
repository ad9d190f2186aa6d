//! Group repository. Rows are keyed by `(wx_id, group_id)`.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::group::{Group, GroupUpsert};

const TABLE_NAME: &str = "wx_groups";
const SELECT_COLUMNS: &str = "id, wx_id, group_id, group_nick_name, create_time, update_time";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Inserts the group, or renames it when the nickname changed.
    async fn save_or_update(
        &self,
        wx_id: &str,
        group_id: &str,
        nick_name: &str,
    ) -> sqlx::Result<GroupUpsert>;

    /// Deletes every group of `wx_id` whose id is not in `keep`.
    /// An empty `keep` deletes all of them.
    async fn delete_not_in(&self, wx_id: &str, keep: &[String]) -> sqlx::Result<u64>;

    async fn list_by_wx_id(&self, wx_id: &str) -> sqlx::Result<Vec<Group>>;

    async fn count_by_wx_id(&self, wx_id: &str) -> sqlx::Result<i64>;

    /// Case-sensitive substring match on the nickname.
    async fn search_by_nick_name(&self, fragment: &str) -> sqlx::Result<Vec<Group>>;
}

#[derive(Debug, Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn save_or_update(
        &self,
        wx_id: &str,
        group_id: &str,
        nick_name: &str,
    ) -> sqlx::Result<GroupUpsert> {
        // No row comes back when the stored nickname already matches.
        let query = format!(
            "INSERT INTO {table} AS g (wx_id, group_id, group_nick_name) VALUES ($1, $2, $3) \
             ON CONFLICT (wx_id, group_id) DO UPDATE \
             SET group_nick_name = EXCLUDED.group_nick_name, update_time = NOW() \
             WHERE g.group_nick_name IS DISTINCT FROM EXCLUDED.group_nick_name \
             RETURNING (xmax = 0) AS inserted",
            table = TABLE_NAME
        );
        let inserted = sqlx::query_scalar::<_, bool>(&query)
            .bind(wx_id)
            .bind(group_id)
            .bind(nick_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match inserted {
            Some(true) => GroupUpsert::Created,
            Some(false) => GroupUpsert::Renamed,
            None => GroupUpsert::Unchanged,
        })
    }

    async fn delete_not_in(&self, wx_id: &str, keep: &[String]) -> sqlx::Result<u64> {
        let query = format!(
            "DELETE FROM {} WHERE wx_id = $1 AND NOT (group_id = ANY($2))",
            TABLE_NAME
        );
        let result = sqlx::query(&query)
            .bind(wx_id)
            .bind(keep)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_by_wx_id(&self, wx_id: &str) -> sqlx::Result<Vec<Group>> {
        let query = format!(
            "SELECT {} FROM {} WHERE wx_id = $1 ORDER BY id ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(wx_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn count_by_wx_id(&self, wx_id: &str) -> sqlx::Result<i64> {
        let query = format!("SELECT COUNT(*) FROM {} WHERE wx_id = $1", TABLE_NAME);
        sqlx::query_scalar::<_, i64>(&query)
            .bind(wx_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn search_by_nick_name(&self, fragment: &str) -> sqlx::Result<Vec<Group>> {
        let query = format!(
            "SELECT {} FROM {} WHERE group_nick_name LIKE $1 ORDER BY id ASC",
            SELECT_COLUMNS, TABLE_NAME
        );
        sqlx::query_as::<_, Group>(&query)
            .bind(like_pattern(fragment))
            .fetch_all(&self.pool)
            .await
    }
}

/// Wraps `fragment` in `%` after escaping LIKE metacharacters.
pub fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
