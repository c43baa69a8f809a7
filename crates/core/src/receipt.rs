//! Receipt reconciliation.
//!
//! A receipt prefers the gateway's view of a payment (authoritative amount,
//! timestamp and status) and falls back to the locally stored sub-record when
//! the gateway lookup is unavailable.

use serde::Serialize;

use crate::error::CoreError;
use crate::payment::{format_rupees, gateway_status_label, PaymentStatus, PaymentType};
use crate::types::{Paise, Timestamp};

/// Date format printed on receipts.
pub const RECEIPT_DATE_FORMAT: &str = "%d %b %Y, %H:%M UTC";

/// Where the receipt figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptSource {
    Gateway,
    Local,
}

/// Locally stored payment sub-record, as far as receipts are concerned.
#[derive(Debug, Clone)]
pub struct LocalPayment {
    pub status: PaymentStatus,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub amount: Option<Paise>,
    pub completed_at: Option<Timestamp>,
}

/// Payment as re-fetched from the gateway.
#[derive(Debug, Clone)]
pub struct GatewayPaymentView {
    pub id: String,
    pub amount: Paise,
    pub status: String,
    pub method: Option<String>,
    pub created_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptApplicant {
    pub name: String,
    pub email: String,
    pub course: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub payment_type: PaymentType,
    pub title: &'static str,
    pub receipt_number: String,
    pub amount: Paise,
    pub amount_display: String,
    pub date: Option<Timestamp>,
    pub date_display: String,
    pub status: String,
    pub method: Option<String>,
    pub source: ReceiptSource,
    pub applicant: ReceiptApplicant,
}

/// Build a receipt for a completed payment.
///
/// Fails with a validation error when the local sub-record is not completed;
/// a pending or failed payment has no receipt.
pub fn build_receipt(
    payment_type: PaymentType,
    applicant: ReceiptApplicant,
    local: &LocalPayment,
    gateway: Option<GatewayPaymentView>,
) -> Result<Receipt, CoreError> {
    if local.status != PaymentStatus::Completed {
        return Err(CoreError::Validation(format!(
            "No completed {} payment found",
            payment_type.as_str()
        )));
    }

    let (receipt_number, amount, date, status, method, source) = match gateway {
        Some(g) => (
            g.id,
            g.amount,
            g.created_at.or(local.completed_at),
            gateway_status_label(&g.status),
            g.method,
            ReceiptSource::Gateway,
        ),
        None => (
            local
                .payment_id
                .clone()
                .or_else(|| local.order_id.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            local.amount.unwrap_or_default(),
            local.completed_at,
            local.status.display_label().to_string(),
            None,
            ReceiptSource::Local,
        ),
    };

    Ok(Receipt {
        payment_type,
        title: payment_type.receipt_title(),
        receipt_number,
        amount,
        amount_display: format_rupees(amount),
        date,
        date_display: date
            .map(|d| d.format(RECEIPT_DATE_FORMAT).to_string())
            .unwrap_or_else(|| "N/A".to_string()),
        status,
        method,
        source,
        applicant,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn applicant() -> ReceiptApplicant {
        ReceiptApplicant {
            name: "Asha Verma".into(),
            email: "asha@example.com".into(),
            course: "MBA (Co-Ed)".into(),
            phone: "9999999999".into(),
        }
    }

    fn completed_local() -> LocalPayment {
        LocalPayment {
            status: PaymentStatus::Completed,
            order_id: Some("order_1".into()),
            payment_id: Some("pay_1".into()),
            amount: Some(75_000),
            completed_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap()),
        }
    }

    #[test]
    fn gateway_figures_win_when_available() {
        let gateway = GatewayPaymentView {
            id: "pay_1".into(),
            amount: 75_000,
            status: "captured".into(),
            method: Some("upi".into()),
            created_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 10, 29, 0).unwrap()),
        };
        let receipt =
            build_receipt(PaymentType::Registration, applicant(), &completed_local(), Some(gateway))
                .unwrap();
        assert_eq!(receipt.source, ReceiptSource::Gateway);
        assert_eq!(receipt.status, "Completed");
        assert_eq!(receipt.amount_display, "Rs. 750.00");
        assert_eq!(receipt.date_display, "01 Jun 2024, 10:29 UTC");
        assert_eq!(receipt.method.as_deref(), Some("upi"));
    }

    #[test]
    fn falls_back_to_local_record() {
        let receipt =
            build_receipt(PaymentType::Seat, applicant(), &completed_local(), None).unwrap();
        assert_eq!(receipt.source, ReceiptSource::Local);
        assert_eq!(receipt.receipt_number, "pay_1");
        assert_eq!(receipt.amount, 75_000);
        assert_eq!(receipt.status, "Completed");
        assert_eq!(receipt.date_display, "01 Jun 2024, 10:30 UTC");
        assert_eq!(receipt.title, "Seat Lock Payment Receipt");
    }

    #[test]
    fn incomplete_payment_has_no_receipt() {
        let mut local = completed_local();
        local.status = PaymentStatus::Pending;
        local.completed_at = None;
        assert_matches!(
            build_receipt(PaymentType::Registration, applicant(), &local, None),
            Err(CoreError::Validation(_))
        );
    }
}
