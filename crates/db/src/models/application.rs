//! Application entity model.

use admission_core::error::CoreError;
use admission_core::sections::{
    DocumentSet, PersonalDetails, QualificationDetails, SectionFlags, SectionStatus,
};
use admission_core::types::{DbId, Timestamp};
use serde::de::DeserializeOwned;
use sqlx::FromRow;

/// A row from the `applications` table.
#[derive(Debug, Clone, FromRow)]
pub struct Application {
    pub id: DbId,
    pub applicant_id: DbId,
    pub phone: String,

    pub personal_details: Option<serde_json::Value>,
    pub personal_details_completed: bool,
    pub personal_details_enabled: bool,
    pub personal_details_updated_at: Option<Timestamp>,

    pub qualification_details: Option<serde_json::Value>,
    pub qualification_details_completed: bool,
    pub qualification_details_enabled: bool,
    pub qualification_details_updated_at: Option<Timestamp>,

    pub documents: serde_json::Value,
    pub documents_completed: bool,
    pub documents_enabled: bool,
    pub documents_updated_at: Option<Timestamp>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn decode<T: DeserializeOwned>(column: &str, value: &serde_json::Value) -> Result<T, CoreError> {
    serde_json::from_value(value.clone())
        .map_err(|e| CoreError::Internal(format!("Stored {column} is malformed: {e}")))
}

impl Application {
    pub fn flags(&self) -> SectionFlags {
        SectionFlags {
            personal_details: SectionStatus {
                completed: self.personal_details_completed,
                enabled: self.personal_details_enabled,
                last_updated: self.personal_details_updated_at,
            },
            qualification_details: SectionStatus {
                completed: self.qualification_details_completed,
                enabled: self.qualification_details_enabled,
                last_updated: self.qualification_details_updated_at,
            },
            documents: SectionStatus {
                completed: self.documents_completed,
                enabled: self.documents_enabled,
                last_updated: self.documents_updated_at,
            },
        }
    }

    pub fn personal(&self) -> Result<Option<PersonalDetails>, CoreError> {
        self.personal_details
            .as_ref()
            .map(|v| decode("personal_details", v))
            .transpose()
    }

    pub fn qualification(&self) -> Result<Option<QualificationDetails>, CoreError> {
        self.qualification_details
            .as_ref()
            .map(|v| decode("qualification_details", v))
            .transpose()
    }

    pub fn document_set(&self) -> Result<DocumentSet, CoreError> {
        decode("documents", &self.documents)
    }
}
