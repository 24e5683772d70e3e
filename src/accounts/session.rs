//! Session cookie handling.
//!
//! The provider issues the session token; this service only carries it in a
//! cookie and never inspects it.

use crate::{accounts::AccountsConfig, provider::Session};
use anyhow::{anyhow, Result};
use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;

pub const SESSION_COOKIE_NAME: &str = "webadvert_session";

/// RFC 6265 `cookie-octet`.
fn valid_cookie_value(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_graphic() && !matches!(b, b'"' | b',' | b';' | b'\\'))
}

/// Build the `Set-Cookie` value for a provider session.
///
/// Remembered sessions persist for the provider's stated lifetime (or the
/// configured TTL); otherwise the cookie ends with the browser session.
///
/// # Errors
/// Returns an error if the token cannot be carried in a cookie.
pub fn session_cookie(
    config: &AccountsConfig,
    session: &Session,
    remember_me: bool,
) -> Result<HeaderValue> {
    let token = session.token.expose_secret();
    if !valid_cookie_value(token) {
        return Err(anyhow!("session token is not a valid cookie value"));
    }

    let mut cookie = format!("{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax");
    if remember_me {
        let max_age = session
            .expires_in
            .unwrap_or_else(|| config.session_ttl_seconds());
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }

    Ok(HeaderValue::from_str(&cookie)?)
}

/// # Errors
/// Returns an error if the header value cannot be built.
pub fn clear_session_cookie(config: &AccountsConfig) -> Result<HeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

/// Whether the request carries a non-empty session cookie.
pub fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(name, value)| name.trim() == SESSION_COOKIE_NAME && !value.trim().is_empty())
}
