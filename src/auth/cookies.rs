//! Refresh token cookie

use crate::config::CookieConfig;
use axum_extra::extract::cookie::{Cookie, SameSite};

/// HttpOnly cookie carrying the refresh token
pub fn refresh_cookie(config: &CookieConfig, token: String, max_age_secs: u64) -> Cookie<'static> {
    Cookie::build((config.name.clone(), token))
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .path(config.path.clone())
        .max_age(time::Duration::seconds(max_age_secs as i64))
        .build()
}

/// Cookie that makes the browser drop the refresh token
///
/// Emitted on every logout, whether or not the request carried the cookie.
pub fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((config.name.clone(), ""))
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .path(config.path.clone())
        .max_age(time::Duration::ZERO)
        .build()
}
