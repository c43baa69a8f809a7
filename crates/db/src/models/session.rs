//! Applicant session model and DTOs.

use admission_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `applicant_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicantSession {
    pub id: DbId,
    pub applicant_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for opening a session.
pub struct CreateSession {
    pub applicant_id: DbId,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}
