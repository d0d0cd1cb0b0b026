//! JWT token generation and validation
//! Implements access token + refresh token pattern
//!
//! Both token kinds are signed with the same key and carry a `type` claim;
//! each validator accepts only its own kind, so a refresh token can never be
//! used as a bearer credential and vice versa.

use crate::{config::AppConfig, error::AppError};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum secret length for HS256
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Token kind
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID, unique per issued token
    pub jti: String,
}

/// Token pair
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64, // seconds until access token expires
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_exp_secs: u64,
    refresh_token_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from an explicit signing secret and lifetimes
    pub fn new(
        secret: &str,
        access_token_exp_secs: u64,
        refresh_token_exp_secs: u64,
    ) -> Result<Self, AppError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        // Expiry is checked by us against an explicit instant, without leeway
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_exp_secs,
            refresh_token_exp_secs,
        })
    }

    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.security.jwt_secret.expose_secret(),
            config.security.access_token_exp_secs,
            config.security.refresh_token_exp_secs,
        )
    }

    pub fn refresh_token_exp_secs(&self) -> u64 {
        self.refresh_token_exp_secs
    }

    /// Generate access token
    pub fn generate_access_token(&self, username: &str) -> Result<String, AppError> {
        self.generate_access_token_at(username, Utc::now().timestamp())
    }

    /// Generate access token as if issued at `issued_at` (unix seconds)
    pub fn generate_access_token_at(
        &self,
        username: &str,
        issued_at: i64,
    ) -> Result<String, AppError> {
        self.sign(username, TokenType::Access, self.access_token_exp_secs, issued_at)
    }

    /// Generate refresh token
    pub fn generate_refresh_token(&self, username: &str) -> Result<String, AppError> {
        self.generate_refresh_token_at(username, Utc::now().timestamp())
    }

    pub fn generate_refresh_token_at(
        &self,
        username: &str,
        issued_at: i64,
    ) -> Result<String, AppError> {
        self.sign(username, TokenType::Refresh, self.refresh_token_exp_secs, issued_at)
    }

    /// Generate token pair
    pub fn generate_token_pair(&self, username: &str) -> Result<TokenPair, AppError> {
        let now = Utc::now().timestamp();

        Ok(TokenPair {
            access_token: self.generate_access_token_at(username, now)?,
            refresh_token: self.generate_refresh_token_at(username, now)?,
            expires_in: self.access_token_exp_secs,
        })
    }

    fn sign(
        &self,
        username: &str,
        token_type: TokenType,
        ttl_secs: u64,
        issued_at: i64,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: username.to_string(),
            token_type,
            iat: issued_at,
            exp: issued_at + ttl_secs as i64,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode {:?} token: {:?}", token_type, e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Validate signature and expiry at `now` (unix seconds)
    ///
    /// A token is valid strictly before its `exp` instant.
    pub fn validate_token_at(&self, token: &str, now: i64) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::Unauthorized
            })?
            .claims;

        if now >= claims.exp {
            tracing::debug!(exp = claims.exp, now, "Token expired");
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }

    fn validate_kind_at(
        &self,
        token: &str,
        expected: TokenType,
        now: i64,
    ) -> Result<Claims, AppError> {
        let claims = self.validate_token_at(token, now)?;

        if claims.token_type != expected {
            tracing::debug!(
                "Token type mismatch: expected {:?}, got {:?}",
                expected,
                claims.token_type
            );
            return Err(AppError::Unauthorized);
        }

        Ok(claims)
    }

    /// Validate access token specifically
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.validate_access_token_at(token, Utc::now().timestamp())
    }

    pub fn validate_access_token_at(&self, token: &str, now: i64) -> Result<Claims, AppError> {
        self.validate_kind_at(token, TokenType::Access, now)
    }

    /// Validate refresh token specifically
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.validate_refresh_token_at(token, Utc::now().timestamp())
    }

    pub fn validate_refresh_token_at(&self, token: &str, now: i64) -> Result<Claims, AppError> {
        self.validate_kind_at(token, TokenType::Refresh, now)
    }
}
