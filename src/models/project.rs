//! Project domain models

use super::pagination::{PageRequest, SortDirection, SortField};
use super::patch::{present, Field, FieldValue, Patch};
use super::ticket::Ticket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Project, owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project detail including its tickets
#[derive(Debug, Serialize)]
pub struct ProjectWithTickets {
    #[serde(flatten)]
    pub project: Project,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectField {
    Name,
    Description,
}

impl Field for ProjectField {
    fn column(self) -> &'static str {
        match self {
            ProjectField::Name => "name",
            ProjectField::Description => "description",
        }
    }
}

impl Patch for UpdateProjectRequest {
    type Field = ProjectField;

    const FIELDS: &'static [ProjectField] = &[ProjectField::Name, ProjectField::Description];

    fn value(&self, field: ProjectField) -> Option<FieldValue> {
        match field {
            ProjectField::Name => self.name.clone().map(|v| FieldValue::Text(Some(v))),
            ProjectField::Description => self.description.clone().map(FieldValue::Text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectSortField {
    Id,
    Name,
}

impl ProjectSortField {
    /// Unknown fields fall back to `id`
    pub fn from_param(value: &str) -> Self {
        match value {
            "name" => ProjectSortField::Name,
            _ => ProjectSortField::Id,
        }
    }
}

impl SortField for ProjectSortField {
    fn column(self) -> &'static str {
        match self {
            ProjectSortField::Id => "id",
            ProjectSortField::Name => "name",
        }
    }
}

/// Query string for `GET /projects`
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectListQuery {
    #[serde(default)]
    #[validate(range(min = 0, max = 10000))]
    pub page: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default = "default_sort_field")]
    pub sort_field: String,
    #[serde(default = "default_sort_direction")]
    pub sort_direction: String,
}

fn default_limit() -> i64 {
    5
}

fn default_sort_field() -> String {
    "id".to_string()
}

fn default_sort_direction() -> String {
    "asc".to_string()
}

impl ProjectListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn sort(&self) -> (ProjectSortField, SortDirection) {
        (
            ProjectSortField::from_param(&self.sort_field),
            SortDirection::parse_lenient(&self.sort_direction),
        )
    }
}

impl Default for ProjectListQuery {
    fn default() -> Self {
        Self {
            page: 0,
            limit: default_limit(),
            sort_field: default_sort_field(),
            sort_direction: default_sort_direction(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_only_present_fields() {
        let req: UpdateProjectRequest = serde_json::from_str(r#"{"name": "P2"}"#).unwrap();
        let changes = req.changes();
        assert_eq!(changes.columns(), vec!["name"]);
        assert_eq!(
            changes.get("name"),
            Some(&FieldValue::Text(Some("P2".to_string())))
        );
    }

    #[test]
    fn test_update_null_description_clears_it() {
        let req: UpdateProjectRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        let changes = req.changes();
        assert_eq!(changes.columns(), vec!["description"]);
        assert_eq!(changes.get("description"), Some(&FieldValue::Text(None)));
    }

    #[test]
    fn test_update_ignores_fields_outside_whitelist() {
        let req: UpdateProjectRequest =
            serde_json::from_str(r#"{"owner_id": 99, "id": 5}"#).unwrap();
        assert!(req.changes().is_empty());
    }

    #[test]
    fn test_sort_field_fallback() {
        assert_eq!(ProjectSortField::from_param("name"), ProjectSortField::Name);
        assert_eq!(ProjectSortField::from_param("owner_id"), ProjectSortField::Id);
        assert_eq!(ProjectSortField::from_param(""), ProjectSortField::Id);
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ProjectListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.limit, 5);
        assert_eq!(query.sort(), (ProjectSortField::Id, SortDirection::Asc));
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_list_query_limit_bounds() {
        let query = ProjectListQuery {
            limit: 101,
            ..Default::default()
        };
        assert!(query.validate().is_err());

        let query = ProjectListQuery {
            page: -1,
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }
}
