//! Handlers for the `/auth` resource: credential login, external identity
//! sign-in, session checks and logout.

use admission_core::applicant::{
    normalize_email, resolve_identity, validate_phone, IdentityProviderKind, IdentityResolution,
};
use admission_core::course::Course;
use admission_core::error::CoreError;
use admission_db::models::applicant::{
    Applicant, ApplicantResponse, CompleteProfile, CreateApplicant,
};
use admission_db::models::session::CreateSession;
use admission_db::repositories::{ApplicantRepo, SessionRepo};
use axum::extract::State;
use axum::http::header::{SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::cookie::{expired_session_cookie, session_cookie};
use crate::auth::password::{verify_dummy, verify_password};
use crate::auth::session::{generate_session_token, session_key};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeApplicant;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/external/register`.
#[derive(Debug, Deserialize)]
pub struct ExternalRegisterRequest {
    /// ID token issued by the identity provider.
    pub credential: String,
}

/// Request body for `POST /auth/external/complete-signup`.
#[derive(Debug, Deserialize)]
pub struct CompleteSignupRequest {
    pub credential: String,
    pub phone: String,
    pub course: String,
    /// Overrides the provider's display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Body returned by every endpoint that signs an applicant in.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: ApplicantResponse,
}

/// Identity details the client uses to prefill the completion form.
#[derive(Debug, Serialize)]
pub struct IdentitySummary {
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRegisterResponse {
    pub success: bool,
    pub is_registered: bool,
    pub profile_complete: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ApplicantResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentitySummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAuthResponse {
    pub is_authenticated: bool,
    pub user: Option<ApplicantResponse>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password and open a session.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Response> {
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid email or password".into(),
        ))
    };

    let applicant =
        ApplicantRepo::find_by_email(&state.pool, &normalize_email(&input.email)).await?;

    // Unknown and passwordless accounts fail exactly like a wrong password.
    let Some((applicant, hash)) =
        applicant.and_then(|a| a.password_hash.clone().map(|hash| (a, hash)))
    else {
        verify_dummy(&input.password);
        return Err(invalid());
    };

    let password_valid = verify_password(&input.password, &hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(invalid());
    }

    let cookie = open_session(&state, &applicant, &headers).await?;
    tracing::info!(applicant_id = applicant.id, "Applicant logged in");

    with_cookie(
        StatusCode::OK,
        SessionResponse {
            success: true,
            message: "Login successful",
            user: ApplicantResponse::from(&applicant),
        },
        Some(cookie),
    )
}

/// POST /api/v1/auth/external/register
///
/// Resolve an identity-provider credential. A fully registered applicant is
/// signed in; otherwise the client is told which profile fields to collect.
pub async fn external_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ExternalRegisterRequest>,
) -> AppResult<Response> {
    let identity = state.identity.resolve(&input.credential).await?;
    let email = normalize_email(&identity.email);

    let existing =
        ApplicantRepo::find_by_email_or_external_id(&state.pool, &email, &identity.external_id)
            .await?;
    let resolution = resolve_identity(
        existing
            .as_ref()
            .map(|a| (a.phone.as_deref(), a.course.as_deref())),
    );
    let summary = IdentitySummary {
        name: identity.display_name.clone(),
        email,
    };

    match (resolution, existing) {
        (IdentityResolution::Registered, Some(applicant)) => {
            let cookie = open_session(&state, &applicant, &headers).await?;
            tracing::info!(applicant_id = applicant.id, "Applicant signed in with external identity");
            with_cookie(
                StatusCode::OK,
                ExternalRegisterResponse {
                    success: true,
                    is_registered: true,
                    profile_complete: true,
                    message: "User already registered",
                    user: Some(ApplicantResponse::from(&applicant)),
                    identity: None,
                },
                Some(cookie),
            )
        }
        (_, Some(applicant)) => with_cookie(
            StatusCode::OK,
            ExternalRegisterResponse {
                success: true,
                is_registered: true,
                profile_complete: false,
                message: "Phone number and course are required to finish registration",
                user: Some(ApplicantResponse::from(&applicant)),
                identity: Some(summary),
            },
            None,
        ),
        (_, None) => with_cookie(
            StatusCode::OK,
            ExternalRegisterResponse {
                success: true,
                is_registered: false,
                profile_complete: false,
                message: "User not found, proceed to complete registration",
                user: None,
                identity: Some(summary),
            },
            None,
        ),
    }
}

/// POST /api/v1/auth/external/complete-signup
///
/// Attach phone and course to an external identity, creating the applicant
/// when none exists yet, and open a session.
pub async fn complete_signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CompleteSignupRequest>,
) -> AppResult<Response> {
    let phone = input.phone.trim().to_string();
    validate_phone(&phone)?;
    let course = Course::parse(&input.course)?;
    let name = input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    // The credential is re-resolved; the client never asserts email or id.
    let identity = state.identity.resolve(&input.credential).await?;
    let email = normalize_email(&identity.email);

    let existing =
        ApplicantRepo::find_by_email_or_external_id(&state.pool, &email, &identity.external_id)
            .await?;

    // The application row is keyed by the phone recorded at signup.
    if let Some(current) = existing.as_ref().and_then(|a| a.phone.as_deref()) {
        if current != phone {
            return Err(AppError::Core(CoreError::Validation(
                "Phone number cannot be changed after registration".into(),
            )));
        }
    }

    if let Some(owner) = ApplicantRepo::find_by_phone(&state.pool, &phone).await? {
        if existing.as_ref().map(|a| a.id) != Some(owner.id) {
            return Err(AppError::Core(CoreError::Conflict(
                "Phone number already in use".into(),
            )));
        }
    }

    let applicant = match existing {
        Some(applicant) => {
            let update = CompleteProfile {
                phone,
                course: course.as_str().to_string(),
                external_id: Some(identity.external_id.clone()),
                name,
            };
            ApplicantRepo::complete_profile(&state.pool, applicant.id, &update)
                .await?
                .ok_or_else(|| AppError::Core(CoreError::not_found("Applicant", applicant.id)))?
        }
        None => {
            let create = CreateApplicant {
                name: name
                    .or_else(|| identity.display_name.clone())
                    .unwrap_or_else(|| email.clone()),
                email,
                phone: Some(phone),
                password_hash: None,
                identity_provider: IdentityProviderKind::External,
                external_id: Some(identity.external_id.clone()),
                course: Some(course.as_str().to_string()),
            };
            ApplicantRepo::create(&state.pool, &create).await?
        }
    };

    let cookie = open_session(&state, &applicant, &headers).await?;
    tracing::info!(applicant_id = applicant.id, "External signup completed");

    with_cookie(
        StatusCode::OK,
        SessionResponse {
            success: true,
            message: "Profile completed successfully",
            user: ApplicantResponse::from(&applicant),
        },
        Some(cookie),
    )
}

/// GET /api/v1/auth/check-auth
///
/// Report whether the caller holds an active session. Never fails for
/// anonymous callers.
pub async fn check_auth(
    State(state): State<AppState>,
    MaybeApplicant(auth): MaybeApplicant,
) -> AppResult<Json<CheckAuthResponse>> {
    let user = match auth {
        Some(auth) => ApplicantRepo::find_by_id(&state.pool, auth.applicant_id)
            .await?
            .as_ref()
            .map(ApplicantResponse::from),
        None => None,
    };

    Ok(Json(CheckAuthResponse {
        is_authenticated: user.is_some(),
        user,
    }))
}

/// POST /api/v1/auth/logout
///
/// Revoke the current session (if any) and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    MaybeApplicant(auth): MaybeApplicant,
) -> AppResult<Response> {
    if let Some(auth) = auth {
        SessionRepo::revoke_by_token_hash(&state.pool, &auth.session_key).await?;
        tracing::info!(applicant_id = auth.applicant_id, "Applicant logged out");
    }

    with_cookie(
        StatusCode::OK,
        LogoutResponse { success: true },
        Some(expired_session_cookie(&state.config.session)),
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Issue a session token for `applicant`, persist its session row and return
/// the `Set-Cookie` value.
pub(crate) async fn open_session(
    state: &AppState,
    applicant: &Applicant,
    headers: &HeaderMap,
) -> AppResult<String> {
    let config = &state.config.session;
    let (token, claims) =
        generate_session_token(applicant.id, &applicant.email, applicant.phone.as_deref(), config)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            applicant_id: applicant.id,
            token_hash: session_key(&claims.jti),
            expires_at: claims.expires_at(),
            user_agent: header_str(USER_AGENT.as_str()),
            ip_address: header_str("x-forwarded-for"),
        },
    )
    .await?;

    Ok(session_cookie(&token, config))
}

/// JSON response with an optional `Set-Cookie` header.
pub(crate) fn with_cookie<T: Serialize>(
    status: StatusCode,
    body: T,
    cookie: Option<String>,
) -> AppResult<Response> {
    let mut response = (status, Json(body)).into_response();
    if let Some(cookie) = cookie {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::InternalError(format!("Invalid cookie header: {e}")))?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

