//! Handlers for the `/payment` resource: order creation, verification,
//! client-reported outcomes, order history and receipts.
//!
//! Orders are persisted as `pending` the moment the gateway mints them. Only
//! [`verify`] can complete a payment: it checks the checkout signature, then
//! re-fetches the payment from the gateway and confirms order id and amount
//! before writing. [`update`] accepts client reports of abandoned or failed
//! checkouts and never upgrades a payment to `completed` on its own.

use std::collections::BTreeMap;

use admission_core::error::CoreError;
use admission_core::forms::render_receipt;
use admission_core::payment::{
    check_client_update, check_gateway_payment_matches, check_order_allowed, order_receipt,
    verify_signature, GatewaySettlement, PaymentStatus, PaymentType, UpdateDecision,
    PAISE_PER_RUPEE,
};
use admission_core::receipt::{build_receipt, Receipt, ReceiptApplicant};
use admission_db::models::payment::{PaymentRecord, PaymentResponse};
use admission_db::models::payment_order::{CreatePaymentOrder, PaymentOrder, SettleOrder};
use admission_db::repositories::payment_order_repo::SettleOutcome;
use admission_db::repositories::{ApplicationRepo, PaymentOrderRepo, PaymentRepo};
use admission_providers::{CreateOrderRequest, GatewayOrder};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::{ensure_own_phone, load_applicant, pdf_attachment, render_pdf, require_phone};
use crate::middleware::auth::AuthApplicant;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /payment/create`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    /// Optional client-side amount in rupees; must match the configured fee.
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order: GatewayOrder,
    /// Public gateway key for the browser checkout.
    pub key_id: String,
    pub payment_type: PaymentType,
    /// Fee in rupees.
    pub amount: i64,
}

/// Request body for `POST /payment/verify`. Accepts the gateway checkout's
/// field names as aliases.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyInput {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    #[serde(alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

/// Request body for `POST /payment/update`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInput {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    #[serde(alias = "order_id")]
    pub order_id: String,
    #[serde(default, alias = "payment_id")]
    pub payment_id: Option<String>,
    pub status: PaymentStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Outcome of a verify or update call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub order_id: String,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    /// False while the gateway has not yet captured or failed the payment.
    pub settled: bool,
    /// The type's sub-record after the call; `None` when a newer attempt
    /// owns it.
    pub payment: Option<PaymentResponse>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/payment/create
///
/// Mint a gateway order for the configured fee and persist it as `pending`.
pub async fn create_order(
    State(state): State<AppState>,
    auth: AuthApplicant,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<DataResponse<CreateOrderResponse>>> {
    let payment_type = input.payment_type;
    state
        .config
        .fees
        .check_client_amount(payment_type, input.amount)?;

    let applicant = load_applicant(&state, auth.applicant_id).await?;
    let phone = require_phone(&applicant)?;
    let application = ApplicationRepo::find_by_applicant(&state.pool, applicant.id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Complete all application sections before making a payment".into(),
            ))
        })?;

    let mut registration = None;
    let mut current = None;
    for record in PaymentRepo::list_for_application(&state.pool, application.id).await? {
        let record_type = record.payment_type()?;
        let status = record.status()?;
        if record_type == PaymentType::Registration {
            registration = Some(status);
        }
        if record_type == payment_type {
            current = Some(status);
        }
    }
    check_order_allowed(
        payment_type,
        application.flags().all_completed(),
        registration,
        current,
    )?;

    let amount = state.config.fees.amount_paise(payment_type);
    let receipt = order_receipt(Utc::now());
    let notes = BTreeMap::from([
        ("applicationId".to_string(), application.id.to_string()),
        ("phone".to_string(), phone.to_string()),
        (
            "course".to_string(),
            applicant.course.clone().unwrap_or_default(),
        ),
        ("type".to_string(), payment_type.as_str().to_string()),
    ]);

    // Nothing is persisted if the gateway refuses the order.
    let order = state
        .payment_gateway
        .create_order(&CreateOrderRequest {
            amount,
            currency: state.config.gateway.currency.clone(),
            receipt: receipt.clone(),
            notes,
        })
        .await?;

    PaymentOrderRepo::create_with_pending_payment(
        &state.pool,
        &CreatePaymentOrder {
            application_id: application.id,
            payment_type,
            order_id: order.id.clone(),
            amount_paise: amount,
            currency: order.currency.clone(),
            receipt,
        },
    )
    .await?;

    tracing::info!(
        applicant_id = applicant.id,
        application_id = application.id,
        payment_type = payment_type.as_str(),
        order_id = %order.id,
        amount,
        "Payment order created"
    );

    Ok(Json(DataResponse {
        data: CreateOrderResponse {
            order,
            key_id: state.payment_gateway.key_id().to_string(),
            payment_type,
            amount: amount / PAISE_PER_RUPEE,
        },
    }))
}

/// POST /api/v1/payment/verify
///
/// Verify a checkout result and record the gateway's outcome. Returns 202
/// when the gateway has not settled the payment yet.
pub async fn verify(
    State(state): State<AppState>,
    auth: AuthApplicant,
    Json(input): Json<VerifyInput>,
) -> AppResult<Response> {
    let order = load_owned_order(&state, &auth, input.payment_type, &input.order_id).await?;

    if let Err(e) = verify_signature(
        &state.config.gateway.key_secret,
        &input.order_id,
        &input.payment_id,
        &input.signature,
    ) {
        tracing::warn!(
            applicant_id = auth.applicant_id,
            order_id = %input.order_id,
            "Payment signature mismatch"
        );
        return Err(e.into());
    }

    if order.status()? == PaymentStatus::Completed {
        return acknowledge_completed(&state, order, Some(input.payment_id.as_str())).await;
    }

    let payment = state.payment_gateway.fetch_payment(&input.payment_id).await?;
    check_gateway_payment_matches(
        &order.order_id,
        order.amount_paise,
        payment.order_id.as_deref().unwrap_or_default(),
        payment.amount,
    )?;

    let settlement = GatewaySettlement::from_gateway_status(&payment.status);
    let Some(status) = settlement.payment_status() else {
        tracing::info!(
            order_id = %order.order_id,
            gateway_status = %payment.status,
            "Payment not yet settled"
        );
        let outcome = PaymentOutcome {
            order_id: order.order_id.clone(),
            payment_type: input.payment_type,
            status: PaymentStatus::Pending,
            settled: false,
            payment: current_record(&state, &order).await?,
        };
        return Ok((StatusCode::ACCEPTED, Json(DataResponse { data: outcome })).into_response());
    };

    let failure_reason = match status {
        PaymentStatus::Failed => payment
            .error_description
            .clone()
            .or_else(|| Some("Payment failed at the gateway".to_string())),
        _ => None,
    };

    let outcome = PaymentOrderRepo::settle(
        &state.pool,
        &order.order_id,
        &SettleOrder {
            status,
            payment_id: Some(payment.id.clone()),
            failure_reason,
        },
    )
    .await?;

    match outcome {
        SettleOutcome::Settled { order, payment } => {
            tracing::info!(
                applicant_id = auth.applicant_id,
                payment_type = input.payment_type.as_str(),
                order_id = %order.order_id,
                status = status.as_str(),
                "Payment verified"
            );
            Ok(Json(DataResponse {
                data: PaymentOutcome {
                    order_id: order.order_id,
                    payment_type: input.payment_type,
                    status,
                    settled: true,
                    payment: payment.as_ref().map(PaymentResponse::from),
                },
            })
            .into_response())
        }
        // Lost a race with another verify of the same order.
        SettleOutcome::AlreadyCompleted(order) => {
            acknowledge_completed(&state, order, Some(input.payment_id.as_str())).await
        }
        SettleOutcome::NotFound => Err(AppError::Core(CoreError::not_found(
            "Payment order",
            &input.order_id,
        ))),
    }
}

/// POST /api/v1/payment/update
///
/// Record a client-reported outcome (`pending` or `failed`). `completed` is
/// only accepted as an acknowledgement of an already verified order.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthApplicant,
    Json(input): Json<UpdateInput>,
) -> AppResult<Response> {
    let order = load_owned_order(&state, &auth, input.payment_type, &input.order_id).await?;

    let decision = check_client_update(
        input.status,
        order.status()?,
        order.payment_id.as_deref(),
        input.payment_id.as_deref(),
    )?;
    if decision == UpdateDecision::Acknowledge {
        return acknowledge_completed(&state, order, input.payment_id.as_deref()).await;
    }

    let outcome = PaymentOrderRepo::settle(
        &state.pool,
        &order.order_id,
        &SettleOrder {
            status: input.status,
            payment_id: input.payment_id.clone(),
            failure_reason: input.reason.clone(),
        },
    )
    .await?;

    match outcome {
        SettleOutcome::Settled { order, payment } => {
            tracing::info!(
                applicant_id = auth.applicant_id,
                payment_type = input.payment_type.as_str(),
                order_id = %order.order_id,
                status = input.status.as_str(),
                "Payment status reported by client"
            );
            Ok(Json(DataResponse {
                data: PaymentOutcome {
                    order_id: order.order_id,
                    payment_type: input.payment_type,
                    status: input.status,
                    settled: input.status != PaymentStatus::Pending,
                    payment: payment.as_ref().map(PaymentResponse::from),
                },
            })
            .into_response())
        }
        SettleOutcome::AlreadyCompleted(_) => Err(AppError::Core(CoreError::Conflict(
            "A completed payment cannot be changed".into(),
        ))),
        SettleOutcome::NotFound => Err(AppError::Core(CoreError::not_found(
            "Payment order",
            &input.order_id,
        ))),
    }
}

/// GET /api/v1/payment/orders
///
/// Every order the caller has created, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    auth: AuthApplicant,
) -> AppResult<Json<DataResponse<Vec<PaymentOrder>>>> {
    let orders = match ApplicationRepo::find_by_applicant(&state.pool, auth.applicant_id).await? {
        Some(application) => {
            PaymentOrderRepo::list_for_application(&state.pool, application.id).await?
        }
        None => Vec::new(),
    };
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/payment/receipt/{phone}
pub async fn registration_receipt(
    State(state): State<AppState>,
    auth: AuthApplicant,
    Path(phone): Path<String>,
) -> AppResult<Json<DataResponse<Receipt>>> {
    let receipt = load_receipt(&state, &auth, &phone, PaymentType::Registration).await?;
    Ok(Json(DataResponse { data: receipt }))
}

/// GET /api/v1/payment/receipt/{phone}/download
pub async fn download_registration_receipt(
    State(state): State<AppState>,
    auth: AuthApplicant,
    Path(phone): Path<String>,
) -> AppResult<Response> {
    let receipt = load_receipt(&state, &auth, &phone, PaymentType::Registration).await?;
    let bytes = render_pdf(move || render_receipt(&receipt)).await?;
    Ok(pdf_attachment("payment-receipt.pdf", bytes))
}

/// GET /api/v1/payment/seat-receipt/{phone}
pub async fn seat_receipt(
    State(state): State<AppState>,
    auth: AuthApplicant,
    Path(phone): Path<String>,
) -> AppResult<Json<DataResponse<Receipt>>> {
    let receipt = load_receipt(&state, &auth, &phone, PaymentType::Seat).await?;
    Ok(Json(DataResponse { data: receipt }))
}

/// GET /api/v1/payment/seat-receipt/{phone}/download
pub async fn download_seat_receipt(
    State(state): State<AppState>,
    auth: AuthApplicant,
    Path(phone): Path<String>,
) -> AppResult<Response> {
    let receipt = load_receipt(&state, &auth, &phone, PaymentType::Seat).await?;
    let bytes = render_pdf(move || render_receipt(&receipt)).await?;
    Ok(pdf_attachment("seat-lock-receipt.pdf", bytes))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load an order that belongs to the caller's application and has the
/// requested type. Anything else reads as not found.
async fn load_owned_order(
    state: &AppState,
    auth: &AuthApplicant,
    payment_type: PaymentType,
    order_id: &str,
) -> AppResult<PaymentOrder> {
    let not_found = || AppError::Core(CoreError::not_found("Payment order", order_id));

    let order = PaymentOrderRepo::find_by_order_id(&state.pool, order_id)
        .await?
        .ok_or_else(not_found)?;
    let application = ApplicationRepo::find_by_applicant(&state.pool, auth.applicant_id)
        .await?
        .ok_or_else(not_found)?;

    if order.application_id != application.id || order.payment_type()? != payment_type {
        return Err(not_found());
    }
    Ok(order)
}

async fn current_record(
    state: &AppState,
    order: &PaymentOrder,
) -> AppResult<Option<PaymentResponse>> {
    let record: Option<PaymentRecord> =
        PaymentRepo::find(&state.pool, order.application_id, order.payment_type()?).await?;
    Ok(record.as_ref().map(PaymentResponse::from))
}

/// Respond for an order that is already completed. Only the payment that
/// completed it is acknowledged.
async fn acknowledge_completed(
    state: &AppState,
    order: PaymentOrder,
    payment_id: Option<&str>,
) -> AppResult<Response> {
    if order.payment_id.as_deref() != payment_id {
        return Err(AppError::Core(CoreError::Conflict(
            "This order was already completed with a different payment".into(),
        )));
    }
    let outcome = PaymentOutcome {
        order_id: order.order_id.clone(),
        payment_type: order.payment_type()?,
        status: PaymentStatus::Completed,
        settled: true,
        payment: current_record(state, &order).await?,
    };
    Ok(Json(DataResponse { data: outcome }).into_response())
}

/// Build a receipt for the caller's completed payment, preferring the
/// gateway's figures and falling back to the stored sub-record.
async fn load_receipt(
    state: &AppState,
    auth: &AuthApplicant,
    phone: &str,
    payment_type: PaymentType,
) -> AppResult<Receipt> {
    let applicant = load_applicant(state, auth.applicant_id).await?;
    ensure_own_phone(&applicant, phone)?;

    let application = ApplicationRepo::find_by_phone(&state.pool, phone)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Application", phone)))?;

    let record = PaymentRepo::find(&state.pool, application.id, payment_type)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "No completed {} payment found",
                payment_type.as_str()
            )))
        })?;
    let local = record.to_local_payment()?;

    let gateway = match (local.status, local.payment_id.as_deref()) {
        (PaymentStatus::Completed, Some(payment_id)) => {
            match state.payment_gateway.fetch_payment(payment_id).await {
                Ok(payment) => Some(payment.to_receipt_view()),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        payment_id,
                        payment_type = payment_type.as_str(),
                        "Gateway lookup failed, using stored payment for receipt"
                    );
                    None
                }
            }
        }
        _ => None,
    };

    let receipt = build_receipt(
        payment_type,
        ReceiptApplicant {
            name: applicant.name.clone(),
            email: applicant.email.clone(),
            course: applicant.course.clone().unwrap_or_default(),
            phone: phone.to_string(),
        },
        &local,
        gateway,
    )?;
    Ok(receipt)
}
