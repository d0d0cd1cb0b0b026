//! 认证服务：登录、令牌刷新、身份解析

use crate::{
    auth::jwt::{JwtService, TokenPair},
    auth::password::{hash_password, verify_password},
    error::AppError,
    models::{auth::LoginForm, user::User},
    repository::UserRepository,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    /// 用户不存在时参与校验的哈希
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_service: Arc<JwtService>) -> Self {
        Self {
            db,
            jwt_service,
            dummy_hash: OnceCell::new(),
        }
    }

    /// 校验用户名和密码
    ///
    /// 用户不存在、已停用或密码错误都返回同一个 `Unauthorized`，
    /// 且三种情况都会执行一次 Argon2 校验。
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        let Some(user) = user_repo.find_by_username(username).await? else {
            let dummy = self.dummy_hash().await?;
            // 结果无关紧要，只保持耗时一致
            let _ = verify_password(password.to_string(), dummy).await;
            return Err(AppError::Unauthorized);
        };

        verify_password(password.to_string(), user.hashed_password.clone()).await?;

        if !user.is_active {
            tracing::info!(username = %username, "Login attempt on inactive account");
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    async fn dummy_hash(&self) -> Result<String, AppError> {
        self.dummy_hash
            .get_or_try_init(|| hash_password(uuid::Uuid::new_v4().to_string()))
            .await
            .cloned()
    }

    /// 用户登录，签发访问令牌和刷新令牌
    pub async fn login(&self, form: &LoginForm) -> Result<TokenPair, AppError> {
        let user = match self.authenticate(&form.username, &form.password).await {
            Ok(user) => user,
            Err(e) => {
                tracing::info!(username = %form.username, "Login failed");
                return Err(e);
            }
        };

        let pair = self.jwt_service.generate_token_pair(&user.username)?;

        tracing::info!(user_id = user.id, username = %user.username, "User logged in");
        metrics::counter!("auth_logins_total").increment(1);

        Ok(pair)
    }

    /// 刷新令牌
    ///
    /// 每次刷新都签发新的令牌对；旧的刷新令牌在过期前仍然有效。
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, AppError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let claims = self.jwt_service.validate_refresh_token(token)?;

        let user = self.active_user(&claims.sub).await?;

        let pair = self.jwt_service.generate_token_pair(&user.username)?;

        tracing::debug!(user_id = user.id, "Token pair rotated");

        Ok(pair)
    }

    /// 由访问令牌解析当前用户
    pub async fn resolve_identity(&self, access_token: &str) -> Result<User, AppError> {
        let claims = self.jwt_service.validate_access_token(access_token)?;
        self.active_user(&claims.sub).await
    }

    async fn active_user(&self, username: &str) -> Result<User, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        let user = user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }
}
