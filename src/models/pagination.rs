//! Pagination and sorting shared by project and ticket listings

use crate::error::AppError;
use serde::Serialize;

/// One page of a scoped listing
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole filtered set, independent of page and limit
    pub total: i64,
}

/// Zero-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        self.page * self.limit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Only `asc` or `desc` (any case) are accepted
    pub fn parse_strict(value: &str) -> Result<Self, AppError> {
        match value.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(AppError::bad_request("Invalid sort_direction (asc/desc)")),
        }
    }

    /// `desc` sorts descending, anything else ascending
    pub fn parse_lenient(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A whitelisted sort column
pub trait SortField: Copy {
    fn column(self) -> &'static str;

    /// ORDER BY clause, tie-broken on `id` so pages stay stable
    fn order_by(self, direction: SortDirection) -> String {
        let column = self.column();
        if column == "id" {
            format!(" ORDER BY id {}", direction.as_sql())
        } else {
            format!(" ORDER BY {} {}, id {}", column, direction.as_sql(), direction.as_sql())
        }
    }
}
