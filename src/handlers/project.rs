//! 项目 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    extract::{ValidatedJson, ValidatedPath, ValidatedQuery},
    middleware::AppState,
    models::project::{CreateProjectRequest, ProjectListQuery, UpdateProjectRequest},
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedQuery(query): ValidatedQuery<ProjectListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .project_service
        .list(&auth_context.scope(), &query)
        .await?;
    Ok(Json(page))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let project = state
        .project_service
        .create(&auth_context.scope(), &req)
        .await?;
    Ok(Json(project))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let project = state.project_service.get(&auth_context.scope(), id).await?;
    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let project = state
        .project_service
        .update(&auth_context.scope(), id, &req)
        .await?;
    Ok(Json(project))
}

/// 删除项目，返回被删除的记录
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let project = state
        .project_service
        .delete(&auth_context.scope(), id)
        .await?;
    Ok(Json(project))
}
