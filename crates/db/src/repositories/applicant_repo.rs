//! Repository for the `applicants` table.

use admission_core::types::DbId;
use sqlx::PgPool;

use crate::models::applicant::{Applicant, CompleteProfile, CreateApplicant};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, phone, password_hash, identity_provider, \
                       external_id, course, created_at, updated_at";

/// Provides CRUD operations for applicants.
pub struct ApplicantRepo;

impl ApplicantRepo {
    /// Insert a new applicant, returning the created row.
    ///
    /// Duplicate email, phone or external id surface as unique violations
    /// (`uq_applicants_*`).
    pub async fn create(pool: &PgPool, input: &CreateApplicant) -> Result<Applicant, sqlx::Error> {
        let query = format!(
            "INSERT INTO applicants
                (name, email, phone, password_hash, identity_provider, external_id, course)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Applicant>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.password_hash)
            .bind(input.identity_provider.as_str())
            .bind(&input.external_id)
            .bind(&input.course)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Applicant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applicants WHERE id = $1");
        sqlx::query_as::<_, Applicant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find by (normalised) email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Applicant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applicants WHERE email = $1");
        sqlx::query_as::<_, Applicant>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<Applicant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applicants WHERE phone = $1");
        sqlx::query_as::<_, Applicant>(&query)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Find the applicant matching either the email or the external id.
    ///
    /// When both match different rows, the external id match wins.
    pub async fn find_by_email_or_external_id(
        pool: &PgPool,
        email: &str,
        external_id: &str,
    ) -> Result<Option<Applicant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM applicants
             WHERE email = $1 OR external_id = $2
             ORDER BY (external_id = $2) DESC NULLS LAST, id
             LIMIT 1"
        );
        sqlx::query_as::<_, Applicant>(&query)
            .bind(email)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Set phone and course (and optionally link the external identity and
    /// rename). Returns `None` if the applicant does not exist.
    pub async fn complete_profile(
        pool: &PgPool,
        id: DbId,
        input: &CompleteProfile,
    ) -> Result<Option<Applicant>, sqlx::Error> {
        let query = format!(
            "UPDATE applicants SET
                phone = $2,
                course = $3,
                external_id = COALESCE($4, external_id),
                identity_provider = CASE WHEN $4 IS NULL THEN identity_provider ELSE 'external' END,
                name = COALESCE($5, name)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Applicant>(&query)
            .bind(id)
            .bind(&input.phone)
            .bind(&input.course)
            .bind(&input.external_id)
            .bind(&input.name)
            .fetch_optional(pool)
            .await
    }
}
