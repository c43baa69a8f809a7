//! Gateway order audit model and DTOs.

use admission_core::error::CoreError;
use admission_core::payment::{PaymentStatus, PaymentType};
use admission_core::types::{DbId, Paise, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `payment_orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrder {
    pub id: DbId,
    pub application_id: DbId,
    pub payment_type: String,
    pub order_id: String,
    pub amount_paise: Paise,
    pub currency: String,
    pub receipt: String,
    pub status: String,
    pub payment_id: Option<String>,
    pub failure_reason: Option<String>,
    pub settled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentOrder {
    pub fn payment_type(&self) -> Result<PaymentType, CoreError> {
        PaymentType::from_str_db(&self.payment_type)
    }

    pub fn status(&self) -> Result<PaymentStatus, CoreError> {
        PaymentStatus::from_str_db(&self.status)
    }
}

/// DTO for recording a freshly minted gateway order.
#[derive(Debug, Clone)]
pub struct CreatePaymentOrder {
    pub application_id: DbId,
    pub payment_type: PaymentType,
    pub order_id: String,
    pub amount_paise: Paise,
    pub currency: String,
    pub receipt: String,
}

/// Outcome to record against an order.
#[derive(Debug, Clone)]
pub struct SettleOrder {
    pub status: PaymentStatus,
    pub payment_id: Option<String>,
    pub failure_reason: Option<String>,
}
