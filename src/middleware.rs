//! HTTP 中间件
//! 应用状态、请求追踪、登录限流

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    error::AppError,
    services::{AuthService, ProjectService, TicketService, UserService},
};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::{
    collections::VecDeque,
    future::Future,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 服务无内部可变状态，使用 Arc 共享；限流器内部是并发安全的 DashMap。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: sqlx::PgPool,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub project_service: Arc<ProjectService>,
    pub ticket_service: Arc<TicketService>,
    pub login_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig, db: sqlx::PgPool) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);

        let login_limiter = Arc::new(IpRateLimiter::new(
            config.security.login_rate_limit as usize,
            Duration::from_secs(config.security.login_rate_window_secs),
        ));

        Ok(Self {
            auth_service: Arc::new(AuthService::new(db.clone(), jwt_service.clone())),
            user_service: Arc::new(UserService::new(db.clone(), config.security.clone())),
            project_service: Arc::new(ProjectService::new(db.clone())),
            ticket_service: Arc::new(TicketService::new(db.clone())),
            jwt_service,
            login_limiter,
            config,
            db,
        })
    }
}

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 当前请求的 request_id（仅在追踪中间件内有值）
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// 在给定 request_id 下执行 future
pub async fn with_request_id<F: Future>(request_id: String, fut: F) -> F::Output {
    REQUEST_ID.scope(request_id, fut).await
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = with_request_id(request_id.clone(), next.run(req)).await;

        let elapsed = start.elapsed();
        let status = response.status();

        // 指标标签只使用有限取值
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "OTHER",
        };
        let status_class = match status.as_u16() {
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_class)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// 登录限流中间件
pub async fn login_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&req, state.config.security.trust_proxy);

    if !state.login_limiter.check(ip) {
        tracing::warn!(client_ip = %ip, "Login rate limit exceeded");
        metrics::counter!("auth_login_rate_limited_total").increment(1);
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(req).await)
}

/// 获取客户端 IP 地址
///
/// 仅在信任代理时读取代理头，其次使用连接地址，最后回退到回环地址。
pub fn client_ip(req: &Request, trust_proxy: bool) -> IpAddr {
    let headers = req.headers();

    if trust_proxy {
        // X-Forwarded-For 可能包含多个 IP，取第一个
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok());
        if let Some(ip) = real_ip {
            return ip;
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }

    tracing::debug!("Could not determine client IP, using loopback address");
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

// ==================== 限流服务 ====================

/// IP 级别的速率限制器
/// 使用滑动窗口算法实现
pub struct IpRateLimiter {
    requests: DashMap<IpAddr, VecDeque<Instant>>,
    max_requests: usize,
    window: Duration,
}

impl IpRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// 检查是否允许请求，允许时记录本次请求
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    pub fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut requests = self.requests.entry(ip).or_default();

        // 清理窗口外的请求记录
        while let Some(&front) = requests.front() {
            if now.saturating_duration_since(front) < self.window {
                break;
            }
            requests.pop_front();
        }

        if requests.len() < self.max_requests {
            requests.push_back(now);
            true
        } else {
            false
        }
    }

    /// 当前跟踪的 IP 数量
    pub fn tracked_ips(&self) -> usize {
        self.requests.len()
    }

    /// 移除窗口内已无请求记录的 IP
    pub fn purge_idle(&self, now: Instant) {
        let window = self.window;
        self.requests.retain(|_, requests| {
            requests
                .back()
                .is_some_and(|&last| now.saturating_duration_since(last) < window)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_extract_or_generate_trace_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "test-trace-123".parse().unwrap());

        let trace_id = extract_or_generate_trace_id(&headers);
        assert_eq!(trace_id, "test-trace-123");

        let headers = HeaderMap::new();
        let trace_id = extract_or_generate_trace_id(&headers);
        assert!(!trace_id.is_empty());
        assert_ne!(trace_id, "test-trace-123");
    }

    #[test]
    fn test_ip_rate_limiter_window() {
        let limiter = IpRateLimiter::new(3, Duration::from_secs(60));
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let start = Instant::now();

        assert!(limiter.check_at(ip, start));
        assert!(limiter.check_at(ip, start + Duration::from_secs(1)));
        assert!(limiter.check_at(ip, start + Duration::from_secs(2)));
        // 第 4 次被拒绝
        assert!(!limiter.check_at(ip, start + Duration::from_secs(3)));

        // 其他 IP 不受影响
        let other: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check_at(other, start + Duration::from_secs(3)));

        // 第一条记录滑出窗口后恢复一个名额
        assert!(limiter.check_at(ip, start + Duration::from_secs(60)));
        assert!(!limiter.check_at(ip, start + Duration::from_secs(60)));
    }

    #[test]
    fn test_purge_idle() {
        let limiter = IpRateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_at("10.0.0.1".parse().unwrap(), start);
        limiter.check_at("10.0.0.2".parse().unwrap(), start + Duration::from_secs(30));

        limiter.purge_idle(start + Duration::from_secs(61));
        assert_eq!(limiter.tracked_ips(), 1);
    }

    #[test]
    fn test_client_ip_sources() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.5, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(client_ip(&req, true), "203.0.113.5".parse::<IpAddr>().unwrap());
        // 不信任代理时忽略代理头
        assert_eq!(client_ip(&req, false), IpAddr::V4(Ipv4Addr::LOCALHOST));

        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.7:4000".parse::<SocketAddr>().unwrap()));
        assert_eq!(client_ip(&req, false), "192.0.2.7".parse::<IpAddr>().unwrap());
    }
}
