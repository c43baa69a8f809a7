//! Session token generation and validation.
//!
//! A session token is an HS256-signed JWT carrying a [`Claims`] payload. Every
//! token has a matching `applicant_sessions` row keyed by the SHA-256 of its
//! `jti`, so a token is only honoured while that row is active and logout can
//! revoke it server-side.

use admission_core::hashing::sha256_hex;
use admission_core::types::{DbId, Timestamp};
use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the applicant's internal database id.
    pub sub: DbId,
    pub email: String,
    /// Absent until the applicant has completed their profile.
    pub phone: Option<String>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4); its hash keys the session row.
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> Timestamp {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

/// Configuration for session tokens and the session cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Session lifetime in hours (default: 24).
    pub expiry_hours: i64,
    pub cookie_name: String,
    /// Add the `Secure` attribute to the cookie.
    pub cookie_secure: bool,
}

/// Default session lifetime in hours.
const DEFAULT_EXPIRY_HOURS: i64 = 24;
/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "admission_session";

impl SessionConfig {
    /// Load session configuration from environment variables.
    ///
    /// | Env Var                 | Required | Default             |
    /// |-------------------------|----------|---------------------|
    /// | `SESSION_SECRET`        | **yes**  | --                  |
    /// | `SESSION_EXPIRY_HOURS`  | no       | `24`                |
    /// | `SESSION_COOKIE_NAME`   | no       | `admission_session` |
    /// | `SESSION_COOKIE_SECURE` | no       | `false`             |
    ///
    /// # Panics
    ///
    /// Panics if `SESSION_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("SESSION_SECRET").expect("SESSION_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "SESSION_SECRET must not be empty");

        let expiry_hours: i64 = std::env::var("SESSION_EXPIRY_HOURS")
            .unwrap_or_else(|_| DEFAULT_EXPIRY_HOURS.to_string())
            .parse()
            .expect("SESSION_EXPIRY_HOURS must be a valid i64");

        let cookie_secure: bool = std::env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("SESSION_COOKIE_SECURE must be true or false");

        Self {
            secret,
            expiry_hours,
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| DEFAULT_COOKIE_NAME.into()),
            cookie_secure,
        }
    }

    pub fn max_age_secs(&self) -> i64 {
        self.expiry_hours * 3600
    }
}

/// Generate an HS256 session token for the given applicant.
pub fn generate_session_token(
    applicant_id: DbId,
    email: &str,
    phone: Option<&str>,
    config: &SessionConfig,
) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: applicant_id,
        email: email.to_string(),
        phone: phone.map(str::to_string),
        exp: now + config.max_age_secs(),
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok((token, claims))
}

/// Validate and decode a session token, returning the embedded [`Claims`].
///
/// Checks the signature and expiry only; the caller must still confirm the
/// session row is active.
pub fn validate_token(
    token: &str,
    config: &SessionConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

/// Key under which a token's session row is stored.
pub fn session_key(jti: &str) -> String {
    sha256_hex(jti.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SessionConfig {
        SessionConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            expiry_hours: 24,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: false,
        }
    }

    #[test]
    fn test_generate_and_validate_session_token() {
        let config = test_config();
        let (token, issued) = generate_session_token(42, "a@b.com", Some("9999999999"), &config)
            .expect("token generation should succeed");

        let claims = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.phone.as_deref(), Some("9999999999"));
        assert_eq!(claims.jti, issued.jti);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config();

        // Well beyond the default 60-second leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            email: "a@b.com".to_string(),
            phone: None,
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed");

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_a = test_config();
        let config_b = SessionConfig {
            secret: "secret-bravo".to_string(),
            ..test_config()
        };

        let (token, _) = generate_session_token(1, "a@b.com", None, &config_a)
            .expect("token generation should succeed");

        assert!(
            validate_token(&token, &config_b).is_err(),
            "token signed with a different secret must fail"
        );
    }

    #[test]
    fn test_session_key_is_stable_sha256() {
        let key = session_key("abc");
        assert_eq!(key, session_key("abc"));
        assert_eq!(key.len(), 64);
        assert_ne!(key, session_key("abd"));
    }
}
