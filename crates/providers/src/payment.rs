//! Payment gateway client.
//!
//! Speaks the Razorpay REST API: orders are minted with `POST /v1/orders` and
//! payments re-fetched with `GET /v1/payments/{id}`, both authenticated with
//! HTTP basic auth (key id / key secret).

use std::collections::BTreeMap;

use admission_core::receipt::GatewayPaymentView;
use admission_core::types::{Paise, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{parse_response, ProviderError};

/// Default Razorpay API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.razorpay.com";

/// Order parameters sent to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    /// Amount in the smallest currency unit (paise).
    pub amount: Paise,
    pub currency: String,
    pub receipt: String,
    pub notes: BTreeMap<String, String>,
}

/// Order handle returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: Paise,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Payment as reported by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    pub amount: Paise,
    pub currency: String,
    /// `created`, `authorized`, `captured`, `refunded` or `failed`.
    pub status: String,
    #[serde(default)]
    pub method: Option<String>,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl GatewayPayment {
    pub fn created_at_utc(&self) -> Option<Timestamp> {
        self.created_at
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
    }

    /// The subset of fields receipts reconcile against.
    pub fn to_receipt_view(&self) -> GatewayPaymentView {
        GatewayPaymentView {
            id: self.id.clone(),
            amount: self.amount,
            status: self.status.clone(),
            method: self.method.clone(),
            created_at: self.created_at_utc(),
        }
    }
}

/// Payment gateway seam.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id handed to the browser checkout.
    fn key_id(&self) -> &str;

    /// Mint a new order.
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<GatewayOrder, ProviderError>;

    /// Re-fetch a payment by id.
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, ProviderError>;
}

/// HTTP client for the Razorpay API.
pub struct RazorpayGateway {
    client: reqwest::Client,
    api_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    /// * `api_url` - Base URL without trailing slash, e.g. `https://api.razorpay.com`.
    pub fn new(client: reqwest::Client, api_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
        }
    }
}

/// Gateway ids are alphanumeric with underscores; anything else is refused
/// before it is interpolated into a URL path.
fn check_gateway_id(id: &str) -> Result<(), ProviderError> {
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ProviderError::Rejected(format!("Malformed gateway id '{id}'")))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<GatewayOrder, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/orders", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(request)
            .send()
            .await?;

        let order: GatewayOrder = parse_response(response).await?;
        tracing::debug!(order_id = %order.id, amount = order.amount, "Gateway order created");
        Ok(order)
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, ProviderError> {
        check_gateway_id(payment_id)?;
        let response = self
            .client
            .get(format!("{}/v1/payments/{payment_id}", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await?;

        parse_response(response).await
    }
}
