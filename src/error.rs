//! 统一错误模型
//! 定义所有错误类型和错误响应格式

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 登录限流后客户端应等待的秒数
pub const RETRY_AFTER_SECS: u64 = 60;

/// PostgreSQL 唯一约束冲突
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL 无法存储的字符（文本中的 NUL）
const CHARACTER_NOT_IN_REPERTOIRE: &str = "22021";

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// 业务冲突（重复名称、项目下仍有工单等）
    /// 与既有客户端保持一致，返回 400 而不是 409
    #[error("Conflict ({code}): {message}")]
    Conflict { code: &'static str, message: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            code,
            message: message.into(),
        }
    }

    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Conflict { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 机器可读的错误码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Conflict { code, .. } => code,
            AppError::RateLimitExceeded => "RATE_LIMITED",
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => "UNEXPECTED",
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthorized => "Could not validate credentials".to_string(),
            AppError::Forbidden => "Access denied".to_string(),
            AppError::NotFound(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Conflict { message, .. } => message.clone(),
            AppError::RateLimitExceeded => {
                "Too many attempts. Wait a minute and try again".to_string()
            }
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Unexpected server error".to_string()
            }
        }
    }

    /// 若为唯一约束冲突则转换为业务冲突，否则原样返回
    pub fn on_unique_violation(self, code: &'static str, message: &str) -> Self {
        if self.is_unique_violation() {
            AppError::conflict(code, message)
        } else {
            self
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
        )
    }

    /// 唯一约束冲突时违反的约束名
    pub fn violated_constraint(&self) -> Option<&str> {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) if self.is_unique_violation() => {
                db_err.constraint()
            }
            _ => None,
        }
    }
}

/// 错误响应 DTO
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = crate::middleware::current_request_id()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if status.is_server_error() {
            tracing::error!(
                code = self.code(),
                error = %self,
                request_id = %request_id,
                "Application error"
            );
        } else {
            tracing::debug!(
                code = self.code(),
                error = %self,
                request_id = %request_id,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message: self.user_message(),
                request_id,
            },
        };

        let mut response = (status, Json(body)).into_response();
        match self {
            AppError::Unauthorized => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            AppError::RateLimitExceeded => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
            }
            _ => {}
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        let nul_in_text = matches!(
            &e,
            sqlx::Error::Database(db_err)
                if db_err.code().as_deref() == Some(CHARACTER_NOT_IN_REPERTOIRE)
        );

        if nul_in_text {
            tracing::debug!(error = %e, "Rejected text the database cannot store");
            AppError::bad_request("Text fields must not contain NUL characters")
        } else {
            AppError::Database(e)
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::BadRequest(e.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::db_error;
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_conflict_keeps_bad_request_status_with_own_code() {
        let err = AppError::conflict("PROJECT_HAS_TICKETS", "project has tickets");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "PROJECT_HAS_TICKETS");
        assert_eq!(err.user_message(), "project has tickets");
    }

    #[test]
    fn test_user_message_no_sensitive_info() {
        let error = AppError::Database(sqlx::Error::RowNotFound);
        let message = error.user_message();
        assert_eq!(message, "Unexpected server error");
        assert!(!message.contains("sqlx"));
        assert_eq!(error.code(), "UNEXPECTED");
    }

    #[test]
    fn test_non_unique_errors_pass_through() {
        let err = AppError::Database(sqlx::Error::RowNotFound)
            .on_unique_violation("PROJECT_NAME_TAKEN", "taken");
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_unauthorized_response_headers() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[test]
    fn test_rate_limit_response_has_retry_after() {
        let response = AppError::RateLimitExceeded.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
    }

    #[test]
    fn test_nul_in_text_maps_to_bad_request() {
        let err = AppError::from(db_error("22021", None));
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "BAD_REQUEST");
    }

    #[test]
    fn test_other_database_errors_stay_unexpected() {
        let err = AppError::from(db_error("23503", None));
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_violated_constraint_only_for_unique_violation() {
        let unique = AppError::from(db_error("23505", Some("users_email_key")));
        assert!(unique.is_unique_violation());
        assert_eq!(unique.violated_constraint(), Some("users_email_key"));

        let fk = AppError::from(db_error("23503", Some("tickets_project_id_fkey")));
        assert_eq!(fk.violated_constraint(), None);

        let err = unique.on_unique_violation("EMAIL_TAKEN", "taken");
        assert_eq!(err.code(), "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn test_error_body_reuses_scoped_request_id() {
        let response = crate::middleware::with_request_id("req-123".to_string(), async {
            AppError::not_found("Ticket not found").into_response()
        })
        .await;

        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["request_id"], "req-123");
    }
}
