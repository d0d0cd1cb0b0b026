//! 用户相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    extract::ValidatedJson,
    middleware::AppState,
    models::user::{CreateUserRequest, UpdateUserRequest, UserResponse},
};
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

/// 注册用户（无需认证）
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.register(&req).await?;
    Ok(Json(user))
}

/// 当前用户信息
pub async fn get_current_user(auth_context: AuthContext) -> Json<UserResponse> {
    Json(UserResponse::from(auth_context.user))
}

/// 更新当前用户资料
pub async fn update_current_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.update(&auth_context.user, &req).await?;
    Ok(Json(user))
}
