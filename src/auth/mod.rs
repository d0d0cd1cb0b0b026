//! Authentication module
//! Token issuance/validation, password hashing, refresh cookie and request guard

pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use cookies::{refresh_cookie, removal_cookie};
pub use jwt::{Claims, JwtService, TokenPair, TokenType};
pub use middleware::{extract_token, jwt_auth_middleware, AuthContext};
pub use password::PasswordHasher;
