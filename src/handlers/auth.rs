//! 认证相关的 HTTP 处理器

use crate::{
    auth::cookies::{refresh_cookie, removal_cookie},
    error::AppError,
    extract::ValidatedForm,
    middleware::AppState,
    models::auth::{LoginForm, TokenResponse},
};
use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use std::sync::Arc;

/// 登录（OAuth2 password 表单）
///
/// 访问令牌在响应体中返回，刷新令牌写入 HttpOnly Cookie。
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedForm(form): ValidatedForm<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state.auth_service.login(&form).await?;

    let jar = jar.add(refresh_cookie(
        &state.config.cookie,
        pair.refresh_token,
        state.jwt_service.refresh_token_exp_secs(),
    ));

    Ok((jar, Json(TokenResponse::bearer(pair.access_token))))
}

/// 刷新令牌，同时轮换刷新 Cookie
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let presented = jar
        .get(&state.config.cookie.name)
        .map(|cookie| cookie.value().to_string());

    let pair = state.auth_service.refresh(presented.as_deref()).await?;

    let jar = jar.add(refresh_cookie(
        &state.config.cookie,
        pair.refresh_token,
        state.jwt_service.refresh_token_exp_secs(),
    ));

    Ok((jar, Json(TokenResponse::bearer(pair.access_token))))
}

/// 登出：清除刷新 Cookie，总是成功
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(removal_cookie(&state.config.cookie));

    (jar, Json(json!({ "message": "ok" })))
}
