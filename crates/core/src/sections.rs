//! Application wizard sections: payload shapes, validation, completion flags
//! and server-side step gating.
//!
//! The wizard has three sections submitted independently. Each submission
//! replaces that section's data (documents merge per slot) and marks the
//! section completed. A section may only be submitted once the sections
//! before it are completed.

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Maximum size of a single uploaded document (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// File extensions accepted for uploaded documents.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

// ---------------------------------------------------------------------------
// Sections and completion flags
// ---------------------------------------------------------------------------

/// One of the three wizard sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    PersonalDetails,
    QualificationDetails,
    Documents,
}

impl Section {
    /// Wire name, also the multipart field name for the JSON sections.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PersonalDetails => "personalDetails",
            Self::QualificationDetails => "qualificationDetails",
            Self::Documents => "documents",
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::PersonalDetails => "Personal details",
            Self::QualificationDetails => "Academic details",
            Self::Documents => "Documents",
        }
    }

    /// Sections that must be completed before this one is accepted.
    pub fn prerequisites(self) -> &'static [Section] {
        match self {
            Self::PersonalDetails => &[],
            Self::QualificationDetails => &[Self::PersonalDetails],
            Self::Documents => &[Self::PersonalDetails, Self::QualificationDetails],
        }
    }
}

/// Completion flags for a single section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStatus {
    pub completed: bool,
    pub enabled: bool,
    pub last_updated: Option<Timestamp>,
}

/// Completion flags for the whole wizard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionFlags {
    pub personal_details: SectionStatus,
    pub qualification_details: SectionStatus,
    pub documents: SectionStatus,
}

impl SectionFlags {
    pub fn get(&self, section: Section) -> SectionStatus {
        match section {
            Section::PersonalDetails => self.personal_details,
            Section::QualificationDetails => self.qualification_details,
            Section::Documents => self.documents,
        }
    }

    /// True once every section has been submitted; gates the registration fee.
    pub fn all_completed(&self) -> bool {
        self.personal_details.completed
            && self.qualification_details.completed
            && self.documents.completed
    }
}

/// Reject a submission whose earlier sections are not yet completed.
pub fn check_prerequisites(section: Section, flags: &SectionFlags) -> Result<(), CoreError> {
    let missing: Vec<&str> = section
        .prerequisites()
        .iter()
        .filter(|s| !flags.get(**s).completed)
        .map(|s| s.label())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{} cannot be submitted yet. Complete first: {}",
            section.label(),
            missing.join(", ")
        )))
    }
}

/// Parse and validate a JSON section payload.
///
/// A payload that is not valid JSON for the section's shape is reported as
/// an invalid format; shape-valid payloads then go through field validation.
pub fn parse_section<T>(section: Section, raw: &str) -> Result<T, CoreError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_str(raw).map_err(|e| {
        CoreError::Validation(format!("Invalid {} format: {e}", section.as_str()))
    })?;
    value.validate()?;
    Ok(value)
}

// ---------------------------------------------------------------------------
// Personal details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalDetails {
    #[validate(nested)]
    pub candidate_details: CandidateDetails,
    #[validate(nested)]
    pub parents_details: ParentsDetails,
    #[validate(nested)]
    pub address: Address,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateDetails {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub gender: String,
    #[validate(custom(function = "date_of_birth"))]
    pub date_of_birth: String,
    pub adhaar_no: Option<String>,
}

impl CandidateDetails {
    /// Given, middle and last names joined with single spaces.
    pub fn full_name(&self) -> String {
        [
            Some(self.name.as_str()),
            self.middle_name.as_deref(),
            self.last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ParentsDetails {
    pub father_name: Option<String>,
    #[validate(custom(function = "optional_phone"))]
    pub father_phone: Option<String>,
    pub mother_name: Option<String>,
    #[validate(custom(function = "optional_phone"))]
    pub mother_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    #[validate(custom(function = "not_blank"))]
    pub full_address: String,
    #[validate(custom(function = "not_blank"))]
    pub state: String,
    #[validate(custom(function = "not_blank"))]
    pub city: String,
    #[validate(custom(function = "not_blank"))]
    pub pincode: String,
}

impl PersonalDetails {
    /// Rewrite the date of birth into `YYYY-MM-DD` form.
    ///
    /// Must run after validation, which guarantees the date parses.
    pub fn normalize(mut self) -> Result<Self, CoreError> {
        let dob = parse_date_of_birth(&self.candidate_details.date_of_birth).ok_or_else(|| {
            CoreError::Validation("dateOfBirth must be a valid date".into())
        })?;
        self.candidate_details.date_of_birth = dob.format("%Y-%m-%d").to_string();
        Ok(self)
    }
}

/// Accept either a bare date (`2004-05-17`) or an RFC 3339 timestamp.
pub fn parse_date_of_birth(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

// ---------------------------------------------------------------------------
// Qualification details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct QualificationDetails {
    #[validate(nested)]
    pub high_school: SchoolRecord,
    #[validate(nested)]
    pub intermediate: SchoolRecord,
    #[validate(nested)]
    pub higher_education: Vec<HigherEducation>,
}

/// 10th or 12th standard record. Missing records default to empty values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SchoolRecord {
    pub board: String,
    pub school_name: String,
    pub roll_number: String,
    pub passing_year: Option<i32>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassoutStatus {
    Appearing,
    #[serde(rename = "Passed out")]
    PassedOut,
}

impl PassoutStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Appearing => "Appearing",
            Self::PassedOut => "Passed out",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "passed_out_requires_percentage"))]
pub struct HigherEducation {
    pub degree: String,
    pub university: String,
    pub passout_status: Option<PassoutStatus>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub percentage: Option<f64>,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Upload slots of the documents section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    ProfileImage,
    Marksheet10,
    Marksheet12,
    GraduationMarksheet,
    IdProof,
    GapCertificate,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        Self::ProfileImage,
        Self::Marksheet10,
        Self::Marksheet12,
        Self::GraduationMarksheet,
        Self::IdProof,
        Self::GapCertificate,
    ];

    /// Multipart field name, also the key in the stored documents object.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::ProfileImage => "profileImage",
            Self::Marksheet10 => "marksheet10",
            Self::Marksheet12 => "marksheet12",
            Self::GraduationMarksheet => "graduationMarksheet",
            Self::IdProof => "idProof",
            Self::GapCertificate => "gapCertificate",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.field_name() == name)
    }
}

/// Stored references (URLs) of the uploaded documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marksheet10: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marksheet12: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graduation_marksheet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_proof: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_certificate: Option<String>,
}

impl DocumentSet {
    fn slot_mut(&mut self, kind: DocumentKind) -> &mut Option<String> {
        match kind {
            DocumentKind::ProfileImage => &mut self.profile_image,
            DocumentKind::Marksheet10 => &mut self.marksheet10,
            DocumentKind::Marksheet12 => &mut self.marksheet12,
            DocumentKind::GraduationMarksheet => &mut self.graduation_marksheet,
            DocumentKind::IdProof => &mut self.id_proof,
            DocumentKind::GapCertificate => &mut self.gap_certificate,
        }
    }

    /// Replace the given slots, keeping every slot that was not re-uploaded.
    pub fn merge(&mut self, uploads: impl IntoIterator<Item = (DocumentKind, String)>) {
        for (kind, url) in uploads {
            *self.slot_mut(kind) = Some(url);
        }
    }

    /// A documents section is complete only with a profile image.
    pub fn validate_complete(&self) -> Result<(), CoreError> {
        match self.profile_image.as_deref() {
            Some(url) if !url.is_empty() => Ok(()),
            _ => Err(CoreError::Validation("Profile image is required".into())),
        }
    }

    /// Whether merging uploads of `kinds` would yield a complete set. Runs
    /// before anything is written to storage.
    pub fn validate_incoming(
        &self,
        kinds: impl IntoIterator<Item = DocumentKind>,
    ) -> Result<(), CoreError> {
        let mut pending = self.clone();
        pending.merge(kinds.into_iter().map(|kind| (kind, "pending".to_string())));
        pending.validate_complete()
    }
}

/// Check a single uploaded file before it is handed to object storage.
pub fn validate_upload(kind: DocumentKind, file_name: &str, size: usize) -> Result<(), CoreError> {
    if size == 0 {
        return Err(CoreError::Validation(format!(
            "{} is empty",
            kind.field_name()
        )));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "{} exceeds the {} MiB limit",
            kind.field_name(),
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(CoreError::Validation(format!(
            "{} must be one of: {}",
            kind.field_name(),
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Custom validators
// ---------------------------------------------------------------------------

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("is required".into()));
    }
    Ok(())
}

fn date_of_birth(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    match parse_date_of_birth(value) {
        Some(date) if date <= Utc::now().date_naive() => Ok(()),
        Some(_) => Err(ValidationError::new("date_of_birth")
            .with_message("must not be in the future".into())),
        None => Err(ValidationError::new("date_of_birth")
            .with_message("must be a valid date".into())),
    }
}

fn optional_phone(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    crate::applicant::validate_phone(value)
        .map_err(|_| ValidationError::new("phone").with_message("must be 10 to 12 digits".into()))
}

fn passed_out_requires_percentage(entry: &HigherEducation) -> Result<(), ValidationError> {
    if entry.passout_status == Some(PassoutStatus::PassedOut) && entry.percentage.is_none() {
        return Err(ValidationError::new("percentage")
            .with_message("percentage is required for completed degrees".into()));
    }
    Ok(())
}
