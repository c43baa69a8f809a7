//! Session cookie formatting and parsing.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

use crate::auth::session::SessionConfig;

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, config: &SessionConfig) -> String {
    build(config, token, config.max_age_secs())
}

/// `Set-Cookie` value that clears the session cookie.
pub fn expired_session_cookie(config: &SessionConfig) -> String {
    build(config, "", 0)
}

fn build(config: &SessionConfig, value: &str, max_age: i64) -> String {
    let mut cookie = format!(
        "{}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        config.cookie_name
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of cookie `name` from the request's `Cookie` headers, if present
/// and non-empty.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::auth::session::DEFAULT_COOKIE_NAME;

    fn config(secure: bool) -> SessionConfig {
        SessionConfig {
            secret: "s".into(),
            expiry_hours: 2,
            cookie_name: DEFAULT_COOKIE_NAME.into(),
            cookie_secure: secure,
        }
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("tok", &config(false));
        assert_eq!(
            cookie,
            "admission_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=7200"
        );
        assert!(session_cookie("tok", &config(true)).ends_with("; Secure"));
    }

    #[test]
    fn expired_cookie_has_zero_max_age() {
        let cookie = expired_session_cookie(&config(false));
        assert!(cookie.starts_with("admission_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn read_cookie_finds_named_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; admission_session=abc.def; other=1"),
        );
        assert_eq!(
            read_cookie(&headers, "admission_session").as_deref(),
            Some("abc.def")
        );
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn read_cookie_ignores_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("admission_session="));
        assert_eq!(read_cookie(&headers, "admission_session"), None);
    }
}
