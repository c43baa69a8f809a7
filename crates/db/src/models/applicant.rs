//! Applicant entity model and DTOs.

use admission_core::applicant::IdentityProviderKind;
use admission_core::error::CoreError;
use admission_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full row from the `applicants` table.
///
/// Carries the password hash; use [`ApplicantResponse`] for API output.
#[derive(Debug, Clone, FromRow)]
pub struct Applicant {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub identity_provider: String,
    pub external_id: Option<String>,
    pub course: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Applicant {
    pub fn identity_provider(&self) -> Result<IdentityProviderKind, CoreError> {
        IdentityProviderKind::from_str_db(&self.identity_provider)
    }

    /// Phone and course are both on file.
    pub fn profile_complete(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.is_empty())
            && self.course.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// Applicant representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub course: Option<String>,
    pub identity_provider: String,
}

impl From<&Applicant> for ApplicantResponse {
    fn from(a: &Applicant) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            email: a.email.clone(),
            phone: a.phone.clone(),
            course: a.course.clone(),
            identity_provider: a.identity_provider.clone(),
        }
    }
}

/// DTO for creating a new applicant.
#[derive(Debug, Clone)]
pub struct CreateApplicant {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub identity_provider: IdentityProviderKind,
    pub external_id: Option<String>,
    pub course: Option<String>,
}

/// DTO for completing an externally created profile.
#[derive(Debug, Clone)]
pub struct CompleteProfile {
    pub phone: String,
    pub course: String,
    /// Links the external identity when present.
    pub external_id: Option<String>,
    /// Replaces the display name when present.
    pub name: Option<String>,
}
