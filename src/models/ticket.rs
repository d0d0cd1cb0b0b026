//! Ticket domain models

use super::pagination::{PageRequest, SortDirection, SortField};
use super::patch::{present, Field, FieldValue, Patch};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Ticket
///
/// `owner_id` is the creator; `assigned_to_id` is an optional, possibly
/// different, assignee and grants no access.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project_id: i64,
    pub assigned_to_id: Option<i64>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(max = 20))]
    pub status: Option<String>,
    #[validate(length(max = 20))]
    pub priority: Option<String>,
    pub project_id: i64,
    pub assigned_to_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTicketRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 20))]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 20))]
    pub priority: Option<Option<String>>,
    pub project_id: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_to_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketField {
    Title,
    Description,
    Status,
    Priority,
    ProjectId,
    AssignedToId,
}

impl Field for TicketField {
    fn column(self) -> &'static str {
        match self {
            TicketField::Title => "title",
            TicketField::Description => "description",
            TicketField::Status => "status",
            TicketField::Priority => "priority",
            TicketField::ProjectId => "project_id",
            TicketField::AssignedToId => "assigned_to_id",
        }
    }
}

impl Patch for UpdateTicketRequest {
    type Field = TicketField;

    const FIELDS: &'static [TicketField] = &[
        TicketField::Title,
        TicketField::Description,
        TicketField::Status,
        TicketField::Priority,
        TicketField::ProjectId,
        TicketField::AssignedToId,
    ];

    fn value(&self, field: TicketField) -> Option<FieldValue> {
        match field {
            TicketField::Title => self.title.clone().map(|v| FieldValue::Text(Some(v))),
            TicketField::Description => self.description.clone().map(FieldValue::Text),
            TicketField::Status => self.status.clone().map(FieldValue::Text),
            TicketField::Priority => self.priority.clone().map(FieldValue::Text),
            TicketField::ProjectId => self.project_id.map(|v| FieldValue::BigInt(Some(v))),
            TicketField::AssignedToId => self.assigned_to_id.map(FieldValue::BigInt),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketSortField {
    Id,
    Title,
    Status,
    Priority,
    CreatedAt,
    UpdatedAt,
}

impl TicketSortField {
    /// Unknown fields fall back to `id`
    pub fn from_param(value: &str) -> Self {
        match value {
            "title" => TicketSortField::Title,
            "status" => TicketSortField::Status,
            "priority" => TicketSortField::Priority,
            "created_at" => TicketSortField::CreatedAt,
            "updated_at" => TicketSortField::UpdatedAt,
            _ => TicketSortField::Id,
        }
    }
}

impl SortField for TicketSortField {
    fn column(self) -> &'static str {
        match self {
            TicketSortField::Id => "id",
            TicketSortField::Title => "title",
            TicketSortField::Status => "status",
            TicketSortField::Priority => "priority",
            TicketSortField::CreatedAt => "created_at",
            TicketSortField::UpdatedAt => "updated_at",
        }
    }
}

/// Filters applied on top of the owner scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub project_id: Option<i64>,
    pub search: Option<String>,
}

impl TicketFilter {
    /// ILIKE pattern for the free-text search, if any
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
    }
}

/// Query string for `GET /tickets`
#[derive(Debug, Deserialize, Validate)]
pub struct TicketListQuery {
    #[serde(default)]
    #[validate(range(min = 0, max = 10000))]
    pub page: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default)]
    pub search: String,
    #[serde(default = "default_sort_field")]
    pub sort_field: String,
    #[serde(default = "default_sort_direction")]
    pub sort_direction: String,
    pub project_id: Option<i64>,
}

fn default_limit() -> i64 {
    10
}

fn default_sort_field() -> String {
    "id".to_string()
}

fn default_sort_direction() -> String {
    "desc".to_string()
}

impl TicketListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn filter(&self) -> TicketFilter {
        TicketFilter {
            project_id: self.project_id,
            search: Some(self.search.clone()).filter(|s| !s.is_empty()),
        }
    }

    /// Sort field falls back to `id`; the direction must be `asc` or `desc`
    pub fn sort(&self) -> Result<(TicketSortField, SortDirection), AppError> {
        Ok((
            TicketSortField::from_param(&self.sort_field),
            SortDirection::parse_strict(&self.sort_direction)?,
        ))
    }
}

impl Default for TicketListQuery {
    fn default() -> Self {
        Self {
            page: 0,
            limit: default_limit(),
            search: String::new(),
            sort_field: default_sort_field(),
            sort_direction: default_sort_direction(),
            project_id: None,
        }
    }
}
