//! Request handlers, one module per resource.
//!
//! Handlers delegate rules to `admission_core`, persistence to the
//! repositories in `admission_db`, and map errors via [`AppError`].

pub mod application;
pub mod auth;
pub mod payment;
pub mod registration;

use admission_core::error::CoreError;
use admission_core::types::DbId;
use admission_db::models::applicant::Applicant;
use admission_db::repositories::ApplicantRepo;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Load the applicant behind a session.
pub(crate) async fn load_applicant(state: &AppState, applicant_id: DbId) -> AppResult<Applicant> {
    ApplicantRepo::find_by_id(&state.pool, applicant_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Applicant", applicant_id)))
}

/// The applicant's phone, which keys their application.
pub(crate) fn require_phone(applicant: &Applicant) -> AppResult<&str> {
    applicant
        .phone
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Complete your profile with a phone number first".into(),
            ))
        })
}

/// Documents addressed by phone may only be fetched by their owner.
pub(crate) fn ensure_own_phone(applicant: &Applicant, phone: &str) -> AppResult<()> {
    if applicant.phone.as_deref() == Some(phone) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "You can only access your own application".into(),
        )))
    }
}

/// Run a PDF renderer off the async runtime.
pub(crate) async fn render_pdf<F>(render: F) -> AppResult<Vec<u8>>
where
    F: FnOnce() -> Vec<u8> + Send + 'static,
{
    tokio::task::spawn_blocking(render)
        .await
        .map_err(|e| AppError::InternalError(format!("PDF rendering failed: {e}")))
}

/// Attachment response for a rendered PDF.
pub(crate) fn pdf_attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={file_name}"),
            ),
        ],
        bytes,
    )
        .into_response()
}
