//! Payment workflow rules: fee schedule, order preconditions, gateway
//! signature verification and settlement mapping.
//!
//! Each application carries two independent payment sub-records, one per
//! [`PaymentType`]. A sub-record moves `pending -> completed | failed` and only
//! the latest attempt per type is retained.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::CoreError;
use crate::types::{Paise, Timestamp};

/// Default registration fee in rupees.
pub const DEFAULT_REGISTRATION_FEE: i64 = 750;

/// Default seat-lock fee in rupees.
pub const DEFAULT_SEAT_FEE: i64 = 10_000;

/// Paise per rupee; gateway amounts are in the smallest currency unit.
pub const PAISE_PER_RUPEE: i64 = 100;

/// Default gateway currency.
pub const DEFAULT_CURRENCY: &str = "INR";

// ---------------------------------------------------------------------------
// Payment type and status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Registration fee, unlocked once every wizard section is completed.
    Registration,
    /// Seat-lock fee, unlocked once the registration fee is paid.
    Seat,
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Seat => "seat",
        }
    }

    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "registration" => Ok(Self::Registration),
            "seat" => Ok(Self::Seat),
            _ => Err(CoreError::Internal(format!("Invalid payment type '{s}'"))),
        }
    }

    /// Title printed on the receipt for this payment type.
    pub fn receipt_title(self) -> &'static str {
        match self {
            Self::Registration => "Payment Receipt",
            Self::Seat => "Seat Lock Payment Receipt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(CoreError::Internal(format!("Invalid payment status '{s}'"))),
        }
    }

    /// Capitalised form shown on receipts.
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

/// `completed_at` is set if and only if the status is `completed`.
pub fn completed_at_for(status: PaymentStatus, now: Timestamp) -> Option<Timestamp> {
    (status == PaymentStatus::Completed).then_some(now)
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

/// Fee amounts in rupees, decided server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub registration_rupees: i64,
    pub seat_rupees: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            registration_rupees: DEFAULT_REGISTRATION_FEE,
            seat_rupees: DEFAULT_SEAT_FEE,
        }
    }
}

impl FeeSchedule {
    pub fn rupees(&self, payment_type: PaymentType) -> i64 {
        match payment_type {
            PaymentType::Registration => self.registration_rupees,
            PaymentType::Seat => self.seat_rupees,
        }
    }

    /// Amount to charge through the gateway, in paise.
    pub fn amount_paise(&self, payment_type: PaymentType) -> Paise {
        self.rupees(payment_type) * PAISE_PER_RUPEE
    }

    /// Reject a client-supplied amount (in rupees) that disagrees with the
    /// configured fee. Omitting the amount is fine.
    pub fn check_client_amount(
        &self,
        payment_type: PaymentType,
        client_amount: Option<f64>,
    ) -> Result<(), CoreError> {
        let Some(amount) = client_amount else {
            return Ok(());
        };
        let expected = self.rupees(payment_type);
        if (amount - expected as f64).abs() > f64::EPSILON {
            return Err(CoreError::Validation(format!(
                "Amount for {} payment must be {expected}",
                payment_type.as_str()
            )));
        }
        Ok(())
    }
}

/// Format paise as `Rs. 750.00`.
pub fn format_rupees(amount: Paise) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let per = PAISE_PER_RUPEE as u64;
    format!("Rs. {sign}{}.{:02}", abs / per, abs % per)
}

/// Gateway receipt reference for a new order.
pub fn order_receipt(now: Timestamp) -> String {
    format!("receipt_{}", now.timestamp_millis())
}

// ---------------------------------------------------------------------------
// Order preconditions
// ---------------------------------------------------------------------------

/// Decide whether a new order of `payment_type` may be created.
///
/// * `sections_complete`: every wizard section has been submitted.
/// * `registration`: status of the registration sub-record, if any.
/// * `current`: status of the requested type's sub-record, if any.
pub fn check_order_allowed(
    payment_type: PaymentType,
    sections_complete: bool,
    registration: Option<PaymentStatus>,
    current: Option<PaymentStatus>,
) -> Result<(), CoreError> {
    if current == Some(PaymentStatus::Completed) {
        return Err(CoreError::Conflict(format!(
            "The {} payment has already been completed",
            payment_type.as_str()
        )));
    }
    match payment_type {
        PaymentType::Registration if !sections_complete => Err(CoreError::Validation(
            "Complete all application sections before paying the registration fee".into(),
        )),
        PaymentType::Seat if registration != Some(PaymentStatus::Completed) => {
            Err(CoreError::Validation(
                "The registration fee must be paid before locking a seat".into(),
            ))
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Signature verification
// ---------------------------------------------------------------------------

type HmacSha256 = Hmac<Sha256>;

fn signature_mac(secret: &str, order_id: &str, payment_id: &str) -> Result<HmacSha256, CoreError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CoreError::Internal(format!("HMAC key rejected: {e}")))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(mac)
}

/// Hex-encoded HMAC-SHA256 over `order_id|payment_id`, as the gateway signs
/// checkout results.
pub fn compute_signature(secret: &str, order_id: &str, payment_id: &str) -> Result<String, CoreError> {
    let mac = signature_mac(secret, order_id, payment_id)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a checkout signature in constant time.
pub fn verify_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), CoreError> {
    let mismatch = || CoreError::SignatureMismatch("Invalid payment signature".into());
    let provided = hex::decode(signature.trim()).map_err(|_| mismatch())?;
    signature_mac(secret, order_id, payment_id)?
        .verify_slice(&provided)
        .map_err(|_| mismatch())
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Outcome of a payment as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewaySettlement {
    Completed,
    Failed,
    /// Neither captured nor failed yet (e.g. `created`).
    Unsettled(String),
}

impl GatewaySettlement {
    pub fn from_gateway_status(status: &str) -> Self {
        match status {
            "captured" | "authorized" => Self::Completed,
            "failed" => Self::Failed,
            other => Self::Unsettled(other.to_string()),
        }
    }

    /// Status to write, or `None` when nothing should be written yet.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        match self {
            Self::Completed => Some(PaymentStatus::Completed),
            Self::Failed => Some(PaymentStatus::Failed),
            Self::Unsettled(_) => None,
        }
    }
}

/// Receipt label for a raw gateway status: `captured` reads as `Completed`,
/// anything else is capitalised.
pub fn gateway_status_label(status: &str) -> String {
    if status == "captured" {
        return PaymentStatus::Completed.display_label().to_string();
    }
    let mut chars = status.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The re-fetched gateway payment must belong to the order and carry its amount.
pub fn check_gateway_payment_matches(
    expected_order_id: &str,
    expected_amount: Paise,
    gateway_order_id: &str,
    gateway_amount: Paise,
) -> Result<(), CoreError> {
    if gateway_order_id != expected_order_id {
        return Err(CoreError::SignatureMismatch(
            "Payment does not belong to this order".into(),
        ));
    }
    if gateway_amount != expected_amount {
        return Err(CoreError::SignatureMismatch(format!(
            "Payment amount {gateway_amount} does not match order amount {expected_amount}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Client-reported updates
// ---------------------------------------------------------------------------

/// What to do with a client-reported payment outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Overwrite the sub-record with the reported fields.
    Overwrite,
    /// The order is already completed with this payment; nothing to write.
    Acknowledge,
}

/// Validate a client-reported status against the order's current state.
///
/// Clients may report `pending` or `failed` freely. `completed` is only
/// accepted as an acknowledgement of an order that already passed signature
/// and gateway verification with the same payment id. A completed order is
/// never downgraded.
pub fn check_client_update(
    requested: PaymentStatus,
    order_status: PaymentStatus,
    verified_payment_id: Option<&str>,
    reported_payment_id: Option<&str>,
) -> Result<UpdateDecision, CoreError> {
    match (order_status, requested) {
        (PaymentStatus::Completed, PaymentStatus::Completed) => {
            if verified_payment_id.is_some() && verified_payment_id == reported_payment_id {
                Ok(UpdateDecision::Acknowledge)
            } else {
                Err(CoreError::Forbidden(
                    "Payment id does not match the verified payment".into(),
                ))
            }
        }
        (PaymentStatus::Completed, _) => Err(CoreError::Conflict(
            "A completed payment cannot be changed".into(),
        )),
        (_, PaymentStatus::Completed) => Err(CoreError::Forbidden(
            "Payment must be verified before it can be marked completed".into(),
        )),
        _ => Ok(UpdateDecision::Overwrite),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    const SECRET: &str = "test_key_secret";

    // -- Fees ----------------------------------------------------------------

    #[test]
    fn default_fees_in_paise() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.amount_paise(PaymentType::Registration), 75_000);
        assert_eq!(fees.amount_paise(PaymentType::Seat), 1_000_000);
    }

    #[test]
    fn client_amount_must_match_fee() {
        let fees = FeeSchedule::default();
        assert!(fees.check_client_amount(PaymentType::Registration, None).is_ok());
        assert!(fees.check_client_amount(PaymentType::Registration, Some(750.0)).is_ok());
        assert_matches!(
            fees.check_client_amount(PaymentType::Registration, Some(1.0)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn rupee_formatting() {
        assert_eq!(format_rupees(75_000), "Rs. 750.00");
        assert_eq!(format_rupees(1_000_050), "Rs. 10000.50");
        assert_eq!(format_rupees(5), "Rs. 0.05");
    }

    #[test]
    fn order_receipt_uses_millis() {
        let ts = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(order_receipt(ts), "receipt_1700000000000");
    }

    // -- Preconditions -------------------------------------------------------

    #[test]
    fn registration_requires_all_sections() {
        assert_matches!(
            check_order_allowed(PaymentType::Registration, false, None, None),
            Err(CoreError::Validation(_))
        );
        assert!(check_order_allowed(PaymentType::Registration, true, None, None).is_ok());
    }

    #[test]
    fn seat_requires_completed_registration() {
        for registration in [None, Some(PaymentStatus::Pending), Some(PaymentStatus::Failed)] {
            assert_matches!(
                check_order_allowed(PaymentType::Seat, true, registration, None),
                Err(CoreError::Validation(_))
            );
        }
        assert!(
            check_order_allowed(PaymentType::Seat, true, Some(PaymentStatus::Completed), None)
                .is_ok()
        );
    }

    #[test]
    fn completed_type_cannot_be_reordered() {
        assert_matches!(
            check_order_allowed(
                PaymentType::Registration,
                true,
                Some(PaymentStatus::Completed),
                Some(PaymentStatus::Completed)
            ),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn failed_attempt_can_be_retried() {
        assert!(check_order_allowed(
            PaymentType::Registration,
            true,
            Some(PaymentStatus::Failed),
            Some(PaymentStatus::Failed)
        )
        .is_ok());
    }

    // -- Signatures ----------------------------------------------------------

    #[test]
    fn known_signature_vector() {
        // HMAC-SHA256("test_key_secret", "order_1|pay_1")
        let sig = compute_signature(SECRET, "order_1", "pay_1").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify_signature(SECRET, "order_1", "pay_1", &sig).is_ok());
        assert!(verify_signature(SECRET, "order_1", "pay_1", &sig.to_uppercase()).is_ok());
    }

    #[test]
    fn forged_signatures_never_verify() {
        let pairs = [
            ("order_1", "pay_1"),
            ("order_Nx81", "pay_Nx82"),
            ("", ""),
            ("order|a", "b"),
        ];
        for (order, payment) in pairs {
            let genuine = compute_signature(SECRET, order, payment).unwrap();

            let mut flipped = genuine.clone().into_bytes();
            flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
            let flipped = String::from_utf8(flipped).unwrap();

            let other_secret = compute_signature("other", order, payment).unwrap();
            let swapped = compute_signature(SECRET, payment, order).unwrap();

            for forged in [
                flipped.as_str(),
                other_secret.as_str(),
                &genuine[..62],
                "",
                "not-hex",
                "00",
            ] {
                assert_matches!(
                    verify_signature(SECRET, order, payment, forged),
                    Err(CoreError::SignatureMismatch(_)),
                    "forged signature {forged:?} verified for {order}/{payment}"
                );
            }
            if order != payment {
                assert!(verify_signature(SECRET, order, payment, &swapped).is_err());
            }
        }
    }

    #[test]
    fn separator_prevents_boundary_shifts() {
        let a = compute_signature(SECRET, "order_1", "2pay").unwrap();
        let b = compute_signature(SECRET, "order_12", "pay").unwrap();
        assert_ne!(a, b);
    }

    // -- Settlement ----------------------------------------------------------

    #[test]
    fn gateway_status_mapping() {
        assert_eq!(
            GatewaySettlement::from_gateway_status("captured").payment_status(),
            Some(PaymentStatus::Completed)
        );
        assert_eq!(
            GatewaySettlement::from_gateway_status("authorized").payment_status(),
            Some(PaymentStatus::Completed)
        );
        assert_eq!(
            GatewaySettlement::from_gateway_status("failed").payment_status(),
            Some(PaymentStatus::Failed)
        );
        assert_eq!(
            GatewaySettlement::from_gateway_status("created"),
            GatewaySettlement::Unsettled("created".into())
        );
    }

    #[test]
    fn status_labels() {
        assert_eq!(gateway_status_label("captured"), "Completed");
        assert_eq!(gateway_status_label("refunded"), "Refunded");
        assert_eq!(gateway_status_label(""), "");
    }

    #[test]
    fn gateway_payment_must_match_order() {
        assert!(check_gateway_payment_matches("order_1", 75_000, "order_1", 75_000).is_ok());
        assert_matches!(
            check_gateway_payment_matches("order_1", 75_000, "order_2", 75_000),
            Err(CoreError::SignatureMismatch(_))
        );
        assert_matches!(
            check_gateway_payment_matches("order_1", 75_000, "order_1", 100),
            Err(CoreError::SignatureMismatch(_))
        );
    }

    #[test]
    fn completed_at_only_for_completed() {
        let now = Utc::now();
        assert_eq!(completed_at_for(PaymentStatus::Completed, now), Some(now));
        assert_eq!(completed_at_for(PaymentStatus::Pending, now), None);
        assert_eq!(completed_at_for(PaymentStatus::Failed, now), None);
    }

    // -- Client updates ------------------------------------------------------

    #[test]
    fn client_cannot_self_complete() {
        assert_matches!(
            check_client_update(PaymentStatus::Completed, PaymentStatus::Pending, None, Some("pay_1")),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn client_can_report_failure_or_pending() {
        for requested in [PaymentStatus::Pending, PaymentStatus::Failed] {
            assert_eq!(
                check_client_update(requested, PaymentStatus::Pending, None, None).unwrap(),
                UpdateDecision::Overwrite
            );
        }
    }

    #[test]
    fn verified_order_is_acknowledged_not_rewritten() {
        assert_eq!(
            check_client_update(
                PaymentStatus::Completed,
                PaymentStatus::Completed,
                Some("pay_1"),
                Some("pay_1")
            )
            .unwrap(),
            UpdateDecision::Acknowledge
        );
        assert_matches!(
            check_client_update(
                PaymentStatus::Completed,
                PaymentStatus::Completed,
                Some("pay_1"),
                Some("pay_2")
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn completed_order_is_never_downgraded() {
        assert_matches!(
            check_client_update(
                PaymentStatus::Failed,
                PaymentStatus::Completed,
                Some("pay_1"),
                Some("pay_1")
            ),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn db_round_trips() {
        for t in [PaymentType::Registration, PaymentType::Seat] {
            assert_eq!(PaymentType::from_str_db(t.as_str()).unwrap(), t);
        }
        for s in [PaymentStatus::Pending, PaymentStatus::Completed, PaymentStatus::Failed] {
            assert_eq!(PaymentStatus::from_str_db(s.as_str()).unwrap(), s);
        }
        assert!(PaymentStatus::from_str_db("captured").is_err());
    }
}
