//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
};

use crate::{
    auth::middleware::jwt_auth_middleware,
    config::CorsConfig,
    handlers,
    middleware::{login_rate_limit_middleware, request_tracking_middleware, AppState},
};

/// 请求体大小上限（1 MiB）
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点
    let public_routes = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/users", post(handlers::user::create_user))
        .route("/token/refresh", post(handlers::auth::refresh_token))
        .route("/logout", post(handlers::auth::logout));

    // 登录（按 IP 限流）
    let login_routes = Router::new()
        .route("/token", post(handlers::auth::login))
        .route_layer(from_fn_with_state(state.clone(), login_rate_limit_middleware));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/users/me", get(handlers::user::get_current_user))
        .route("/users/update", put(handlers::user::update_current_user))
        .route(
            "/projects",
            get(handlers::project::list_projects).post(handlers::project::create_project),
        )
        .route(
            "/projects/{id}",
            get(handlers::project::get_project)
                .put(handlers::project::update_project)
                .delete(handlers::project::delete_project),
        )
        .route(
            "/tickets",
            get(handlers::ticket::list_tickets).post(handlers::ticket::create_ticket),
        )
        .route(
            "/tickets/{id}",
            get(handlers::ticket::get_ticket)
                .put(handlers::ticket::update_ticket)
                .delete(handlers::ticket::delete_ticket),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let cors = cors_layer(&state.config.cors);

    Router::new()
        .merge(public_routes)
        .merge(login_routes)
        .merge(authenticated_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(from_fn(request_tracking_middleware))
        .with_state(state)
}

/// 允许携带凭据的跨域配置，仅对配置中的来源开放
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}
