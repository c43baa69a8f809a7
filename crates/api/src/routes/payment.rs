//! Route definitions for the `/payment` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payment;
use crate::state::AppState;

/// Routes mounted at `/payment`.
///
/// ```text
/// POST /create                          -> create_order
/// POST /verify                          -> verify
/// POST /update                          -> update
/// GET  /orders                          -> list_orders
/// GET  /receipt/{phone}                 -> registration_receipt
/// GET  /receipt/{phone}/download        -> download_registration_receipt
/// GET  /seat-receipt/{phone}            -> seat_receipt
/// GET  /seat-receipt/{phone}/download   -> download_seat_receipt
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(payment::create_order))
        .route("/verify", post(payment::verify))
        .route("/update", post(payment::update))
        .route("/orders", get(payment::list_orders))
        .route("/receipt/{phone}", get(payment::registration_receipt))
        .route(
            "/receipt/{phone}/download",
            get(payment::download_registration_receipt),
        )
        .route("/seat-receipt/{phone}", get(payment::seat_receipt))
        .route(
            "/seat-receipt/{phone}/download",
            get(payment::download_seat_receipt),
        )
}
