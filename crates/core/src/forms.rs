//! Printable documents: the application form and payment receipts.

use crate::pdf::PdfBuilder;
use crate::receipt::Receipt;
use crate::sections::{PersonalDetails, QualificationDetails, SchoolRecord};

/// Institution name printed in document headers.
pub const INSTITUTION_NAME: &str = "Admission Portal";

/// Everything printed on the application form.
#[derive(Debug, Clone)]
pub struct ApplicationForm<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub course: &'a str,
    pub personal: Option<&'a PersonalDetails>,
    pub qualification: Option<&'a QualificationDetails>,
}

fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "N/A",
    }
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn school_rows(pdf: &mut PdfBuilder, label: &str, record: &SchoolRecord) {
    pdf.text(label);
    pdf.field("Board", or_na(Some(record.board.as_str())))
        .field("School", or_na(Some(record.school_name.as_str())))
        .field("Roll Number", or_na(Some(record.roll_number.as_str())))
        .field(
            "Passing Year",
            &record
                .passing_year
                .map_or_else(|| "N/A".to_string(), |y| y.to_string()),
        )
        .field("Percentage", &number(record.percentage));
}

/// Render the application form PDF.
pub fn render_application_form(form: &ApplicationForm<'_>) -> Vec<u8> {
    let mut pdf = PdfBuilder::new();
    pdf.title(INSTITUTION_NAME).title("Application Form");

    pdf.heading("Applicant")
        .field("Name", form.name)
        .field("Email", form.email)
        .field("Phone", form.phone)
        .field("Course", form.course);

    pdf.heading("Personal Details");
    match form.personal {
        Some(p) => {
            let c = &p.candidate_details;
            pdf.field("Full Name", &c.full_name())
                .field("Gender", &c.gender)
                .field("Date of Birth", &c.date_of_birth)
                .field("Aadhaar Number", or_na(c.adhaar_no.as_deref()));
            let parents = &p.parents_details;
            pdf.field("Father's Name", or_na(parents.father_name.as_deref()))
                .field("Father's Phone", or_na(parents.father_phone.as_deref()))
                .field("Mother's Name", or_na(parents.mother_name.as_deref()))
                .field("Mother's Phone", or_na(parents.mother_phone.as_deref()));
            let a = &p.address;
            pdf.field("Address", &a.full_address)
                .field("City", &a.city)
                .field("State", &a.state)
                .field("Pincode", &a.pincode);
        }
        None => {
            pdf.text("Not submitted.");
        }
    }

    pdf.heading("Academic Details");
    match form.qualification {
        Some(q) => {
            school_rows(&mut pdf, "10th Standard", &q.high_school);
            school_rows(&mut pdf, "12th Standard", &q.intermediate);
            if q.higher_education.is_empty() {
                pdf.field("Higher Education", "None");
            }
            for (i, entry) in q.higher_education.iter().enumerate() {
                pdf.text(&format!("Higher Education {}", i + 1));
                pdf.field("Degree", or_na(Some(entry.degree.as_str())))
                    .field("University", or_na(Some(entry.university.as_str())))
                    .field(
                        "Status",
                        entry.passout_status.map_or("N/A", |s| s.as_str()),
                    )
                    .field("Percentage", &number(entry.percentage));
            }
        }
        None => {
            pdf.text("Not submitted.");
        }
    }

    pdf.finish()
}

/// Render a receipt PDF (registration or seat lock, per the receipt's title).
pub fn render_receipt(receipt: &Receipt) -> Vec<u8> {
    let mut pdf = PdfBuilder::new();
    pdf.title(INSTITUTION_NAME).title(receipt.title);

    pdf.heading("Payment")
        .field("Receipt Number", &receipt.receipt_number)
        .field("Amount", &receipt.amount_display)
        .field("Date", &receipt.date_display)
        .field("Status", &receipt.status);
    if let Some(method) = &receipt.method {
        pdf.field("Method", method);
    }

    let a = &receipt.applicant;
    pdf.heading("Applicant")
        .field("Name", &a.name)
        .field("Email", &a.email)
        .field("Course", &a.course)
        .field("Phone", &a.phone);

    pdf.spacer(20.0)
        .text("This is a computer generated receipt and does not require a signature.");
    pdf.finish()
}
