//! Repository for the `applications` table.

use admission_core::sections::Section;
use admission_core::types::DbId;
use sqlx::PgPool;

use crate::models::application::Application;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, applicant_id, phone, \
    personal_details, personal_details_completed, personal_details_enabled, \
    personal_details_updated_at, \
    qualification_details, qualification_details_completed, qualification_details_enabled, \
    qualification_details_updated_at, \
    documents, documents_completed, documents_enabled, documents_updated_at, \
    created_at, updated_at";

/// Data column of a section; its flag columns share the name as a prefix.
fn section_column(section: Section) -> &'static str {
    match section {
        Section::PersonalDetails => "personal_details",
        Section::QualificationDetails => "qualification_details",
        Section::Documents => "documents",
    }
}

/// Provides reads and per-section upserts for applications.
pub struct ApplicationRepo;

impl ApplicationRepo {
    pub async fn find_by_applicant(
        pool: &PgPool,
        applicant_id: DbId,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE applicant_id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(applicant_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE phone = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(phone)
            .fetch_optional(pool)
            .await
    }

    /// Write one section in a single statement, creating the application if
    /// needed.
    ///
    /// The section's data is replaced (documents are merged key by key) and
    /// its flags become `completed = enabled = true` with a fresh timestamp.
    /// Other sections are left untouched.
    pub async fn save_section(
        pool: &PgPool,
        applicant_id: DbId,
        phone: &str,
        section: Section,
        data: &serde_json::Value,
    ) -> Result<Application, sqlx::Error> {
        let col = section_column(section);
        let value_expr = match section {
            Section::Documents => "applications.documents || EXCLUDED.documents".to_string(),
            _ => format!("EXCLUDED.{col}"),
        };

        let query = format!(
            "INSERT INTO applications
                (applicant_id, phone, {col}, {col}_completed, {col}_enabled, {col}_updated_at)
             VALUES ($1, $2, $3, true, true, NOW())
             ON CONFLICT (applicant_id) DO UPDATE SET
                {col} = {value_expr},
                {col}_completed = true,
                {col}_enabled = true,
                {col}_updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(applicant_id)
            .bind(phone)
            .bind(data)
            .fetch_one(pool)
            .await
    }
}
