//! Session extractors for Axum handlers.

use admission_core::error::CoreError;
use admission_core::types::DbId;
use admission_db::repositories::SessionRepo;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::cookie::read_cookie;
use crate::auth::session::{session_key, validate_token};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated applicant, resolved from the session cookie or, for
/// non-browser clients, an `Authorization: Bearer` header.
///
/// ```ignore
/// async fn my_handler(auth: AuthApplicant) -> AppResult<Json<()>> {
///     tracing::info!(applicant_id = auth.applicant_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthApplicant {
    /// The applicant's internal database id (from `claims.sub`).
    pub applicant_id: DbId,
    pub email: String,
    /// Phone at the time the session was opened.
    pub phone: Option<String>,
    /// Hash of the token id; keys the session row.
    pub session_key: String,
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthApplicant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = &state.config.session;
        let token = read_cookie(&parts.headers, &session.cookie_name)
            .or_else(|| bearer_token(parts))
            .ok_or_else(|| unauthorized("Not authenticated"))?;

        let claims = validate_token(&token, session)
            .map_err(|_| unauthorized("Invalid or expired session"))?;

        let key = session_key(&claims.jti);
        let active = SessionRepo::find_active_by_token_hash(&state.pool, &key).await?;
        match active {
            Some(row) if row.applicant_id == claims.sub => {}
            _ => return Err(unauthorized("Session has ended, please log in again")),
        }

        Ok(AuthApplicant {
            applicant_id: claims.sub,
            email: claims.email,
            phone: claims.phone,
            session_key: key,
        })
    }
}

/// Like [`AuthApplicant`] but never rejects: anonymous or stale sessions
/// yield `None`. Database failures are still reported.
#[derive(Debug, Clone)]
pub struct MaybeApplicant(pub Option<AuthApplicant>);

impl FromRequestParts<AppState> for MaybeApplicant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthApplicant::from_request_parts(parts, state).await {
            Ok(auth) => Ok(MaybeApplicant(Some(auth))),
            Err(AppError::Core(CoreError::Unauthorized(_))) => Ok(MaybeApplicant(None)),
            Err(e) => Err(e),
        }
    }
}
