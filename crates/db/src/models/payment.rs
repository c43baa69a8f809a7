//! Payment sub-record model and DTOs.

use admission_core::error::CoreError;
use admission_core::payment::{PaymentStatus, PaymentType};
use admission_core::receipt::LocalPayment;
use admission_core::types::{DbId, Paise, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `payments` table: the latest attempt for one payment type.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentRecord {
    pub id: DbId,
    pub application_id: DbId,
    pub payment_type: String,
    pub status: String,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub amount_paise: Option<Paise>,
    pub failure_reason: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentRecord {
    pub fn payment_type(&self) -> Result<PaymentType, CoreError> {
        PaymentType::from_str_db(&self.payment_type)
    }

    pub fn status(&self) -> Result<PaymentStatus, CoreError> {
        PaymentStatus::from_str_db(&self.status)
    }

    pub fn to_local_payment(&self) -> Result<LocalPayment, CoreError> {
        Ok(LocalPayment {
            status: self.status()?,
            order_id: self.order_id.clone(),
            payment_id: self.payment_id.clone(),
            amount: self.amount_paise,
            completed_at: self.completed_at,
        })
    }
}

/// Payment sub-record as exposed by the API. Amounts are in rupees.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub status: String,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub amount: Option<f64>,
    pub failure_reason: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl From<&PaymentRecord> for PaymentResponse {
    fn from(p: &PaymentRecord) -> Self {
        Self {
            status: p.status.clone(),
            order_id: p.order_id.clone(),
            payment_id: p.payment_id.clone(),
            amount: p
                .amount_paise
                .map(|a| a as f64 / admission_core::payment::PAISE_PER_RUPEE as f64),
            failure_reason: p.failure_reason.clone(),
            completed_at: p.completed_at,
            updated_at: p.updated_at,
        }
    }
}

/// Full replacement of a payment sub-record. Every column is written, so
/// omitted fields become NULL.
#[derive(Debug, Clone)]
pub struct WritePayment {
    pub status: PaymentStatus,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub amount_paise: Option<Paise>,
    pub failure_reason: Option<String>,
    pub completed_at: Option<Timestamp>,
}
