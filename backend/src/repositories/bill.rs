//! Read-side bill queries: per-group statistics and the filtered bill list.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::bill::{non_blank, Bill, BillListQuery, BillStat, BillStatsQuery};
use crate::repositories::{common::push_clause, group::like_pattern};

const TABLE_NAME: &str = "wx_bill_info";
const SELECT_COLUMNS: &str = "id, group_name, group_id, dollar, rate, amount::TEXT AS amount, \
     remark, operator, msg_time, status, owner_id, create_time, update_time";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Returns one page of per-group totals plus the number of groups matched.
    async fn stats(&self, query: &BillStatsQuery) -> sqlx::Result<(Vec<BillStat>, i64)>;

    /// Returns one page of bills, newest first, plus the number of bills matched.
    async fn list(&self, query: &BillListQuery) -> sqlx::Result<(Vec<Bill>, i64)>;
}

#[derive(Debug, Clone)]
pub struct PgBillRepository {
    pool: PgPool,
}

impl PgBillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillRepository for PgBillRepository {
    async fn stats(&self, query: &BillStatsQuery) -> sqlx::Result<(Vec<BillStat>, i64)> {
        let page = query.page();

        let mut count_builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT COUNT(*) FROM (SELECT 1 FROM {}",
            TABLE_NAME
        ));
        push_stats_filters(&mut count_builder, query);
        count_builder.push(" GROUP BY group_id, group_name) AS grouped");
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT group_id, group_name AS group_nick, \
             SUM(amount)::NUMERIC(20, 2)::TEXT AS total_amount, COUNT(*) AS count FROM {}",
            TABLE_NAME
        ));
        push_stats_filters(&mut builder, query);
        builder.push(" GROUP BY group_id, group_name ORDER BY group_id ASC, group_name ASC");
        builder.push(" LIMIT ").push_bind(page.page_size());
        builder.push(" OFFSET ").push_bind(page.offset());
        let rows = builder
            .build_query_as::<BillStat>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    async fn list(&self, query: &BillListQuery) -> sqlx::Result<(Vec<Bill>, i64)> {
        let page = query.page();

        let mut count_builder =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", TABLE_NAME));
        push_list_filters(&mut count_builder, query);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {}",
            SELECT_COLUMNS, TABLE_NAME
        ));
        push_list_filters(&mut builder, query);
        builder.push(" ORDER BY create_time DESC, id DESC");
        builder.push(" LIMIT ").push_bind(page.page_size());
        builder.push(" OFFSET ").push_bind(page.offset());
        let rows = builder
            .build_query_as::<Bill>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }
}

fn push_stats_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BillStatsQuery) {
    let mut has_clause = false;
    push_clause(builder, &mut has_clause);
    builder.push("owner_id = ").push_bind(query.owner_id);
    if let Some(group_id) = non_blank(&query.group_id) {
        push_clause(builder, &mut has_clause);
        builder.push("group_id = ").push_bind(group_id.to_string());
    }
    if let Some(group_nick) = non_blank(&query.group_nick) {
        push_clause(builder, &mut has_clause);
        builder
            .push("group_name LIKE ")
            .push_bind(like_pattern(group_nick));
    }
}

fn push_list_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BillListQuery) {
    let mut has_clause = false;
    push_clause(builder, &mut has_clause);
    builder.push("owner_id = ").push_bind(query.owner_id);

    let (start, end) = query.msg_time_range();
    if let Some(start) = start {
        push_clause(builder, &mut has_clause);
        builder.push("msg_time >= ").push_bind(start);
    }
    if let Some(end) = end {
        push_clause(builder, &mut has_clause);
        builder.push("msg_time <= ").push_bind(end);
    }
    if let Some(group_name) = non_blank(&query.group_name) {
        push_clause(builder, &mut has_clause);
        builder
            .push("group_name LIKE ")
            .push_bind(like_pattern(group_name));
    }
    if let Some(group_id) = non_blank(&query.group_id) {
        push_clause(builder, &mut has_clause);
        builder.push("group_id = ").push_bind(group_id.to_string());
    }
    if let Some(status) = non_blank(&query.status) {
        push_clause(builder, &mut has_clause);
        builder.push("status = ").push_bind(status.to_string());
    }
}
