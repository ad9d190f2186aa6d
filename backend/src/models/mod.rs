//! Data models shared across database access and API handlers.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub mod bill;
pub mod group;
pub mod robot;
pub mod session;

/// Uniform response envelope: `code` is 0 on success and -1 on failure.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            code: 0,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code: -1,
            message: message.into(),
            data,
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload; serializes `data` as `null`.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: message.into(),
            data: None,
        }
    }
}

/// Query parameters for page-numbered endpoints.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// 1-based page number (default: 1).
    #[serde(default = "default_page")]
    pub page: i64,
    /// Page size (default: 10, max: 100).
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

impl PageQuery {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// Returns the page number, floored at 1.
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    /// Returns a clamped page size (1..=100).
    pub fn page_size(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }

    /// Row offset of the page. Saturates instead of overflowing for huge page numbers.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// Pagination block returned alongside every paged list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageInfo {
    pub page_no: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(query: PageQuery, total_count: i64) -> Self {
        let page_no = query.page();
        let page_size = query.page_size();
        let total_pages = (total_count + page_size - 1) / page_size;
        Self {
            page_no,
            page_size,
            total_count,
            total_pages,
            has_next: page_no < total_pages,
            has_prev: page_no > 1,
        }
    }
}

/// Wrapper for page-numbered API responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T: Serialize> {
    pub list: Vec<T>,
    pub pagination: PageInfo,
}

impl<T: Serialize> Page<T> {
    pub fn new(list: Vec<T>, query: PageQuery, total_count: i64) -> Self {
        Self {
            list,
            pagination: PageInfo::new(query, total_count),
        }
    }
}
