//! Route definitions for the `/application` resource.

use admission_core::sections::{DocumentKind, MAX_UPLOAD_BYTES};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::application;
use crate::state::AppState;

/// Room for every document slot at the size limit plus form overhead.
const UPDATE_BODY_LIMIT: usize = DocumentKind::ALL.len() * MAX_UPLOAD_BYTES + 1024 * 1024;

/// Routes mounted at `/application`.
///
/// ```text
/// GET  /status                 -> get_status
/// POST /update                 -> update (multipart)
/// GET  /form/{phone}/download  -> download_form
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(application::get_status))
        .route(
            "/update",
            post(application::update).layer(DefaultBodyLimit::max(UPDATE_BODY_LIMIT)),
        )
        .route("/form/{phone}/download", get(application::download_form))
}
