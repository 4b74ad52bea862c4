//! The `session` cookie: building `Set-Cookie` values and reading the
//! token back from request headers.
//!
//! Attributes depend on whether the deployment is served over HTTPS:
//!
//! ```text
//! plain HTTP:  session=<id>; HttpOnly; Path=/; SameSite=Lax
//! HTTPS:       session=<id>; HttpOnly; Path=/; Secure; SameSite=None
//! ```

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use gatehouse_session::SessionId;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session";

/// Builds the `Set-Cookie` value issued on sign-in.
///
/// `max_age_secs` adds a `Max-Age` so the browser drops the cookie when
/// the server-side session expires.
pub fn session_cookie(session_id: &SessionId, secure: bool, max_age_secs: Option<u64>) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={session_id}; HttpOnly; Path=/");
    push_security_attrs(&mut cookie, secure);
    if let Some(secs) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={secs}"));
    }
    cookie
}

/// Builds the `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0");
    push_security_attrs(&mut cookie, secure);
    cookie
}

fn push_security_attrs(cookie: &mut String, secure: bool) {
    if secure {
        cookie.push_str("; Secure; SameSite=None");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
}

/// Extracts the session token from the request's `Cookie` headers.
///
/// Returns `None` when there is no `session` cookie or it is empty.
pub fn read_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
