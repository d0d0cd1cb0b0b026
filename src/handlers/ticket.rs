//! 工单 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    extract::{ValidatedJson, ValidatedPath, ValidatedQuery},
    middleware::AppState,
    models::ticket::{CreateTicketRequest, TicketListQuery, UpdateTicketRequest},
};
use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedQuery(query): ValidatedQuery<TicketListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .ticket_service
        .list(&auth_context.scope(), &query)
        .await?;
    Ok(Json(page))
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateTicketRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state
        .ticket_service
        .create(&auth_context.scope(), &req)
        .await?;
    Ok(Json(ticket))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.ticket_service.get(&auth_context.scope(), id).await?;
    Ok(Json(ticket))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateTicketRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state
        .ticket_service
        .update(&auth_context.scope(), id, &req)
        .await?;
    Ok(Json(ticket))
}

/// 删除工单，返回被删除的记录
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state
        .ticket_service
        .delete(&auth_context.scope(), id)
        .await?;
    Ok(Json(ticket))
}
