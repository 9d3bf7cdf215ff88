//! Session cookie construction.

use axum::http::{HeaderMap, Uri};
use axum_extra::extract::cookie::{Cookie, SameSite};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Whether the request reached us over https, directly or through a proxy
/// that set `X-Forwarded-Proto`.
pub fn is_secure_request(headers: &HeaderMap, uri: &Uri) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }

    headers
        .get_all(FORWARDED_PROTO)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Builds the session cookie carrying `token`.
pub fn session_cookie(
    name: &str,
    token: String,
    secure: bool,
    max_age: std::time::Duration,
) -> Cookie<'static> {
    let max_age = time::Duration::try_from(max_age).unwrap_or(time::Duration::MAX);

    Cookie::build((name.to_string(), token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::None)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Builds a cookie that makes the browser drop the session cookie.
pub fn clear_session_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .http_only(true)
        .path("/")
        .same_site(SameSite::None)
        .secure(secure)
        .max_age(time::Duration::seconds(-1))
        .build()
}
