use admission_core::payment::{FeeSchedule, DEFAULT_CURRENCY};
use admission_providers::identity::DEFAULT_TOKENINFO_URL;
use admission_providers::payment::DEFAULT_API_BASE_URL;

use crate::auth::session::SessionConfig;

/// Payment gateway credentials and endpoint.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Public key id, also handed to the browser checkout.
    pub key_id: String,
    /// Shared secret used for basic auth and checkout signatures.
    pub key_secret: String,
    pub api_base_url: String,
    pub currency: String,
}

impl GatewayConfig {
    /// # Panics
    ///
    /// Panics if `PAYMENT_KEY_ID` or `PAYMENT_KEY_SECRET` is missing or empty.
    pub fn from_env() -> Self {
        let key_id = std::env::var("PAYMENT_KEY_ID").expect("PAYMENT_KEY_ID must be set");
        assert!(!key_id.is_empty(), "PAYMENT_KEY_ID must not be empty");

        let key_secret =
            std::env::var("PAYMENT_KEY_SECRET").expect("PAYMENT_KEY_SECRET must be set");
        assert!(!key_secret.is_empty(), "PAYMENT_KEY_SECRET must not be empty");

        Self {
            key_id,
            key_secret,
            api_base_url: std::env::var("PAYMENT_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.into()),
            currency: std::env::var("PAYMENT_CURRENCY")
                .unwrap_or_else(|_| DEFAULT_CURRENCY.into()),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// Everything except the secrets and the Google client id has a default
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Session token and cookie settings.
    pub session: SessionConfig,
    pub gateway: GatewayConfig,
    /// Fees in rupees.
    pub fees: FeeSchedule,
    /// OAuth client id that external credentials must be issued for.
    pub google_client_id: String,
    pub tokeninfo_url: String,
    /// Directory uploaded documents are written to.
    pub upload_dir: String,
    /// Public URL prefix under which `upload_dir` is served.
    pub upload_public_base_url: String,
    /// Pending orders older than this are reported by the reconciliation job.
    pub order_stale_after_mins: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                                 |
    /// |--------------------------|-----------------------------------------|
    /// | `HOST`                   | `0.0.0.0`                               |
    /// | `PORT`                   | `3000`                                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`                 |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                    |
    /// | `REGISTRATION_FEE`       | `750`                                   |
    /// | `SEAT_FEE`               | `10000`                                 |
    /// | `GOOGLE_CLIENT_ID`       | **required**                            |
    /// | `GOOGLE_TOKENINFO_URL`   | `https://oauth2.googleapis.com/tokeninfo` |
    /// | `UPLOAD_DIR`             | `./uploads`                             |
    /// | `UPLOAD_PUBLIC_BASE_URL` | `http://localhost:3000/uploads`         |
    /// | `ORDER_STALE_AFTER_MINS` | `30`                                    |
    ///
    /// Session variables are documented on [`SessionConfig::from_env`],
    /// gateway variables on [`GatewayConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let defaults = FeeSchedule::default();
        let fees = FeeSchedule {
            registration_rupees: std::env::var("REGISTRATION_FEE")
                .map(|v| v.parse().expect("REGISTRATION_FEE must be a valid i64"))
                .unwrap_or(defaults.registration_rupees),
            seat_rupees: std::env::var("SEAT_FEE")
                .map(|v| v.parse().expect("SEAT_FEE must be a valid i64"))
                .unwrap_or(defaults.seat_rupees),
        };

        let google_client_id =
            std::env::var("GOOGLE_CLIENT_ID").expect("GOOGLE_CLIENT_ID must be set");
        assert!(!google_client_id.is_empty(), "GOOGLE_CLIENT_ID must not be empty");

        let order_stale_after_mins: i64 = std::env::var("ORDER_STALE_AFTER_MINS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("ORDER_STALE_AFTER_MINS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            session: SessionConfig::from_env(),
            gateway: GatewayConfig::from_env(),
            fees,
            google_client_id,
            tokeninfo_url: std::env::var("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|_| DEFAULT_TOKENINFO_URL.into()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()),
            upload_public_base_url: std::env::var("UPLOAD_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/uploads".into()),
            order_stale_after_mins,
        }
    }
}
