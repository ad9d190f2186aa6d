//! Bill records written by downstream accounting bots. This service only reads them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::PageQuery;
use crate::types::BillId;

const MSG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Bill {
    pub id: BillId,
    pub group_name: String,
    pub group_id: String,
    /// Foreign-currency amount as entered.
    pub dollar: String,
    pub rate: String,
    /// `NUMERIC(15,2)` rendered as text.
    pub amount: String,
    pub remark: String,
    pub operator: String,
    /// Unix seconds of the message that produced the bill.
    pub msg_time: i64,
    pub status: String,
    pub owner_id: i64,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Aggregated amount per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BillStat {
    pub group_id: String,
    pub group_nick: String,
    /// Sum of `amount`, always two decimals.
    pub total_amount: String,
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
pub struct BillStatsQuery {
    #[validate(range(min = 1))]
    pub owner_id: i64,
    pub group_id: Option<String>,
    /// Substring of the group name.
    pub group_nick: Option<String>,
    #[serde(default = "default_page")]
    pub page_no: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl BillStatsQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery::new(self.page_no, self.page_size)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
pub struct BillListQuery {
    #[validate(range(min = 1))]
    pub owner_id: i64,
    /// Lower `msg_time` bound, `YYYY-MM-DD HH:MM:SS` (UTC).
    pub create_time_start: Option<String>,
    /// Upper `msg_time` bound, `YYYY-MM-DD HH:MM:SS` (UTC).
    pub create_time_end: Option<String>,
    pub group_name: Option<String>,
    pub group_id: Option<String>,
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page_num: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl BillListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery::new(self.page_num, self.page_size)
    }

    /// Unix-second bounds for `msg_time`; unparsable bounds are ignored.
    pub fn msg_time_range(&self) -> (Option<i64>, Option<i64>) {
        (
            self.create_time_start.as_deref().and_then(parse_msg_time),
            self.create_time_end.as_deref().and_then(parse_msg_time),
        )
    }
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

pub fn parse_msg_time(raw: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(raw.trim(), MSG_TIME_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Treats blank filter values as absent.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
