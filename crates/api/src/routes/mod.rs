pub mod application;
pub mod auth;
pub mod health;
pub mod payment;
pub mod registration;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /register                                  credential registration (public)
///
/// /auth/login                                credential login (public)
/// /auth/external/register                    resolve identity credential (public)
/// /auth/external/complete-signup             finish external signup (public)
/// /auth/check-auth                           session status (public)
/// /auth/logout                               end session
///
/// /application/status                        wizard status (requires auth)
/// /application/update                        submit one section (multipart)
/// /application/form/{phone}/download         application form PDF
///
/// /payment/create                            mint a gateway order
/// /payment/verify                            verify a checkout result
/// /payment/update                            client-reported outcome
/// /payment/orders                            order history
/// /payment/receipt/{phone}[/download]        registration receipt
/// /payment/seat-receipt/{phone}[/download]   seat-lock receipt
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(registration::router())
        .nest("/auth", auth::router())
        .nest("/application", application::router())
        .nest("/payment", payment::router())
}
