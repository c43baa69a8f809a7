//! Handler for credential registration.

use admission_core::applicant::{
    normalize_email, validate_email, validate_name, validate_password_strength, validate_phone,
    IdentityProviderKind,
};
use admission_core::course::Course;
use admission_core::error::CoreError;
use admission_db::models::applicant::{ApplicantResponse, CreateApplicant};
use admission_db::repositories::ApplicantRepo;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::handlers::auth::{open_session, with_cookie, SessionResponse};
use crate::state::AppState;

/// Request body for `POST /register`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub course: String,
    /// Optional; applicants may register without a password.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// POST /api/v1/register
///
/// Create a credential applicant and sign them in. Returns 201 with the
/// session cookie set.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<Response> {
    validate_name(&input.name)?;
    let email = normalize_email(&input.email);
    validate_email(&email)?;
    let phone = input.phone.trim().to_string();
    validate_phone(&phone)?;
    let course = Course::parse(&input.course)?;

    let password = input.password.as_deref().filter(|p| !p.is_empty());
    let password_hash = match password {
        Some(password) => {
            validate_password_strength(password)?;
            if input.confirm_password.as_deref() != Some(password) {
                return Err(AppError::Core(CoreError::Validation(
                    "Passwords do not match".into(),
                )));
            }
            Some(
                hash_password(password)
                    .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?,
            )
        }
        None => None,
    };

    // Friendly pre-checks; a concurrent insert still trips the unique
    // constraints and maps to the same messages.
    if ApplicantRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "Email already registered".into(),
        )));
    }
    if ApplicantRepo::find_by_phone(&state.pool, &phone).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "Phone number already in use".into(),
        )));
    }

    let applicant = ApplicantRepo::create(
        &state.pool,
        &CreateApplicant {
            name: input.name.trim().to_string(),
            email,
            phone: Some(phone),
            password_hash,
            identity_provider: IdentityProviderKind::None,
            external_id: None,
            course: Some(course.as_str().to_string()),
        },
    )
    .await?;

    let cookie = open_session(&state, &applicant, &headers).await?;
    tracing::info!(applicant_id = applicant.id, course = %course, "Applicant registered");

    with_cookie(
        StatusCode::CREATED,
        SessionResponse {
            success: true,
            message: "Registration successful",
            user: ApplicantResponse::from(&applicant),
        },
        Some(cookie),
    )
}
