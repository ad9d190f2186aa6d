//! Groups a session is a member of, as last reported by the automation API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::types::GroupId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Group {
    pub id: GroupId,
    /// Member session's wxid.
    pub wx_id: String,
    /// Chat room id, e.g. `123456@chatroom`.
    pub group_id: String,
    pub group_nick_name: String,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// What a single group upsert did to the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupUpsert {
    Created,
    Renamed,
    Unchanged,
}

impl GroupUpsert {
    pub fn changed(self) -> bool {
        !matches!(self, GroupUpsert::Unchanged)
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupSearchQuery {
    /// Substring matched against the stored nickname.
    pub group_nick_name: String,
}
