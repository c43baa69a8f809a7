//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login                     -> login
/// POST /external/register         -> external_register
/// POST /external/complete-signup  -> complete_signup
/// GET  /check-auth                -> check_auth
/// POST /logout                    -> logout
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/external/register", post(auth::external_register))
        .route("/external/complete-signup", post(auth::complete_signup))
        .route("/check-auth", get(auth::check_auth))
        .route("/logout", post(auth::logout))
}
