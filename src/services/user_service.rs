//! 用户服务：注册与资料维护

use crate::{
    auth::password::{hash_password, PasswordHasher},
    config::SecurityConfig,
    error::AppError,
    models::user::{CreateUserRequest, UpdateUserRequest, User, UserResponse, EMAIL_MAX_LEN},
    repository::{UserChanges, UserRepository},
};
use sqlx::PgPool;
use validator::ValidateEmail;

/// `users.email UNIQUE` 的默认约束名
const EMAIL_CONSTRAINT: &str = "users_email_key";

pub struct UserService {
    db: PgPool,
    security: SecurityConfig,
}

impl UserService {
    pub fn new(db: PgPool, security: SecurityConfig) -> Self {
        Self { db, security }
    }

    /// 注册新用户
    pub async fn register(&self, req: &CreateUserRequest) -> Result<UserResponse, AppError> {
        PasswordHasher::validate_password_policy(&req.password, &self.security)?;

        let user_repo = UserRepository::new(self.db.clone());

        if user_repo.find_by_username(&req.username).await?.is_some() {
            return Err(username_taken());
        }

        if user_repo.find_by_email(&req.email).await?.is_some() {
            return Err(email_taken());
        }

        let hashed_password = hash_password(req.password.clone()).await?;

        let user = user_repo
            .create(
                &req.username,
                req.full_name.as_deref(),
                &req.email,
                &hashed_password,
            )
            .await
            .map_err(user_conflict)?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        Ok(UserResponse::from(user))
    }

    /// 更新当前用户资料，空字符串视为未提供
    pub async fn update(
        &self,
        current: &User,
        req: &UpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        if let Some(username) = req.username() {
            if username.chars().count() < 3 {
                return Err(AppError::bad_request("Username must be at least 3 characters"));
            }
            if let Some(other) = user_repo.find_by_username(username).await? {
                if other.id != current.id {
                    return Err(username_taken());
                }
            }
        }

        if let Some(email) = req.email() {
            if !email.validate_email() {
                return Err(AppError::bad_request("Invalid email address"));
            }
            if email.chars().count() > EMAIL_MAX_LEN {
                return Err(AppError::bad_request(format!(
                    "Email must be at most {} characters",
                    EMAIL_MAX_LEN
                )));
            }
            if let Some(other) = user_repo.find_by_email(email).await? {
                if other.id != current.id {
                    return Err(email_taken());
                }
            }
        }

        let hashed_password = match req.password() {
            Some(password) => {
                PasswordHasher::validate_password_policy(password, &self.security)?;
                Some(hash_password(password.to_string()).await?)
            }
            None => None,
        };

        let changes = UserChanges {
            username: req.username(),
            full_name: req.full_name(),
            email: req.email(),
            hashed_password,
        };

        let user = user_repo
            .update(current.id, &changes)
            .await
            .map_err(user_conflict)?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        tracing::info!(user_id = user.id, "User profile updated");

        Ok(UserResponse::from(user))
    }
}

/// 唯一约束冲突按违反的列区分用户名和邮箱
fn user_conflict(err: AppError) -> AppError {
    if !err.is_unique_violation() {
        return err;
    }

    match err.violated_constraint() {
        Some(EMAIL_CONSTRAINT) => email_taken(),
        _ => username_taken(),
    }
}

fn username_taken() -> AppError {
    AppError::conflict("USERNAME_TAKEN", "Username already registered")
}

fn email_taken() -> AppError {
    AppError::conflict("EMAIL_TAKEN", "Email already registered")
}
