//! Handlers for the `/application` resource: wizard status, section
//! submission and the application form download.

use admission_core::error::CoreError;
use admission_core::forms::{render_application_form, ApplicationForm};
use admission_core::payment::{PaymentStatus, PaymentType};
use admission_core::sections::{
    check_prerequisites, parse_section, validate_upload, DocumentKind, PersonalDetails,
    QualificationDetails, Section, SectionFlags,
};
use admission_core::types::DbId;
use admission_db::models::applicant::Applicant;
use admission_db::models::application::Application;
use admission_db::models::payment::PaymentResponse;
use admission_db::repositories::{ApplicationRepo, PaymentRepo};
use admission_providers::UploadedFile;
use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::{ensure_own_phone, load_applicant, pdf_attachment, render_pdf, require_phone};
use crate::middleware::auth::AuthApplicant;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// The applicant's application joined with their identity and payments.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    /// `None` until the first section is submitted.
    pub application_id: Option<DbId>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub course: Option<String>,
    pub personal_details: Option<serde_json::Value>,
    pub qualification_details: Option<serde_json::Value>,
    pub documents: serde_json::Value,
    pub status: SectionFlags,
    pub payment: Option<PaymentResponse>,
    pub seat_payment: Option<PaymentResponse>,
    /// Every section completed; the registration fee may be paid.
    pub payment_eligible: bool,
}

/// A parsed `POST /application/update` multipart body.
#[derive(Debug, Default)]
struct SectionSubmission {
    personal_details: Option<String>,
    qualification_details: Option<String>,
    files: Vec<(DocumentKind, UploadedFile)>,
}

impl SectionSubmission {
    /// The single section this submission carries.
    fn section(&self) -> Result<Section, CoreError> {
        let present: Vec<Section> = [
            (Section::PersonalDetails, self.personal_details.is_some()),
            (Section::QualificationDetails, self.qualification_details.is_some()),
            (Section::Documents, !self.files.is_empty()),
        ]
        .into_iter()
        .filter_map(|(section, present)| present.then_some(section))
        .collect();

        match present.as_slice() {
            [section] => Ok(*section),
            [] => Err(CoreError::Validation(
                "No section data submitted".into(),
            )),
            _ => Err(CoreError::Validation(
                "Submit exactly one section per request".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/application/status
pub async fn get_status(
    State(state): State<AppState>,
    auth: AuthApplicant,
) -> AppResult<Json<DataResponse<ApplicationStatus>>> {
    let applicant = load_applicant(&state, auth.applicant_id).await?;
    let application = ApplicationRepo::find_by_applicant(&state.pool, applicant.id).await?;
    let data = build_status(&state, &applicant, application).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/application/update
///
/// Multipart body carrying exactly one section: a `personalDetails` or
/// `qualificationDetails` JSON text field, or one or more document files.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthApplicant,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<ApplicationStatus>>> {
    let applicant = load_applicant(&state, auth.applicant_id).await?;
    let phone = require_phone(&applicant)?.to_string();

    let submission = read_submission(multipart).await?;
    let section = submission.section()?;

    let existing = ApplicationRepo::find_by_applicant(&state.pool, applicant.id).await?;
    let flags = existing.as_ref().map(Application::flags).unwrap_or_default();
    check_prerequisites(section, &flags)?;

    let data = match section {
        Section::PersonalDetails => {
            let raw = submission.personal_details.unwrap_or_default();
            let details = parse_section::<PersonalDetails>(section, &raw)?.normalize()?;
            to_json(&details)?
        }
        Section::QualificationDetails => {
            let raw = submission.qualification_details.unwrap_or_default();
            let details = parse_section::<QualificationDetails>(section, &raw)?;
            to_json(&details)?
        }
        Section::Documents => {
            for (kind, file) in &submission.files {
                validate_upload(*kind, &file.file_name, file.bytes.len())?;
            }

            let mut documents = match &existing {
                Some(application) => application.document_set()?,
                None => Default::default(),
            };
            documents.validate_incoming(submission.files.iter().map(|(kind, _)| *kind))?;

            let mut uploaded = Vec::with_capacity(submission.files.len());
            for (kind, file) in submission.files {
                let url = state.storage.store(&phone, file).await?;
                uploaded.push((kind, url));
            }
            documents.merge(uploaded);
            documents.validate_complete()?;
            to_json(&documents)?
        }
    };

    let application =
        ApplicationRepo::save_section(&state.pool, applicant.id, &phone, section, &data).await?;

    tracing::info!(
        applicant_id = applicant.id,
        application_id = application.id,
        section = section.as_str(),
        "Application section saved"
    );

    let data = build_status(&state, &applicant, Some(application)).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/application/form/{phone}/download
///
/// The application form PDF. Requires a completed registration payment.
pub async fn download_form(
    State(state): State<AppState>,
    auth: AuthApplicant,
    Path(phone): Path<String>,
) -> AppResult<Response> {
    let applicant = load_applicant(&state, auth.applicant_id).await?;
    ensure_own_phone(&applicant, &phone)?;

    let application = ApplicationRepo::find_by_phone(&state.pool, &phone)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Application", &phone)))?;

    let paid = PaymentRepo::find(&state.pool, application.id, PaymentType::Registration)
        .await?
        .map(|p| p.status())
        .transpose()?
        == Some(PaymentStatus::Completed);
    if !paid {
        return Err(AppError::Core(CoreError::Forbidden(
            "Payment not completed. Please complete the payment to download the application form."
                .into(),
        )));
    }

    let personal = application.personal()?;
    let qualification = application.qualification()?;
    let bytes = render_pdf(move || {
        render_application_form(&ApplicationForm {
            name: &applicant.name,
            email: &applicant.email,
            phone: &phone,
            course: applicant.course.as_deref().unwrap_or("N/A"),
            personal: personal.as_ref(),
            qualification: qualification.as_ref(),
        })
    })
    .await?;

    tracing::info!(application_id = application.id, "Application form generated");
    Ok(pdf_attachment("application-form.pdf", bytes))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn read_submission(mut multipart: Multipart) -> AppResult<SectionSubmission> {
    let bad = |e: axum::extract::multipart::MultipartError| {
        AppError::BadRequest(format!("Invalid multipart body: {e}"))
    };

    let mut submission = SectionSubmission::default();
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(kind) = DocumentKind::from_field_name(&name) {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(bad)?;
            if file_name.is_empty() && bytes.is_empty() {
                // Browsers send empty parts for untouched file inputs.
                continue;
            }
            submission.files.push((
                kind,
                UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                },
            ));
            continue;
        }

        match name.as_str() {
            "personalDetails" => {
                submission.personal_details = Some(field.text().await.map_err(bad)?);
            }
            "qualificationDetails" => {
                submission.qualification_details = Some(field.text().await.map_err(bad)?);
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }
    Ok(submission)
}

fn to_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize section: {e}")))
}

/// Assemble the status view for an applicant and their (possibly absent)
/// application.
pub(crate) async fn build_status(
    state: &AppState,
    applicant: &Applicant,
    application: Option<Application>,
) -> AppResult<ApplicationStatus> {
    let mut status = ApplicationStatus {
        application_id: None,
        name: applicant.name.clone(),
        email: applicant.email.clone(),
        phone: applicant.phone.clone(),
        course: applicant.course.clone(),
        personal_details: None,
        qualification_details: None,
        documents: serde_json::json!({}),
        status: SectionFlags::default(),
        payment: None,
        seat_payment: None,
        payment_eligible: false,
    };

    let Some(application) = application else {
        return Ok(status);
    };

    for record in PaymentRepo::list_for_application(&state.pool, application.id).await? {
        match record.payment_type()? {
            PaymentType::Registration => status.payment = Some(PaymentResponse::from(&record)),
            PaymentType::Seat => status.seat_payment = Some(PaymentResponse::from(&record)),
        }
    }

    let flags = application.flags();
    status.application_id = Some(application.id);
    status.status = flags;
    status.payment_eligible = flags.all_completed();
    status.personal_details = application.personal_details;
    status.qualification_details = application.qualification_details;
    status.documents = application.documents;
    Ok(status)
}
