#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use admission_api::auth::session::SessionConfig;
use admission_api::config::{GatewayConfig, ServerConfig};
use admission_api::router::build_app_router;
use admission_api::state::AppState;
use admission_core::payment::FeeSchedule;
use admission_providers::{
    CreateOrderRequest, ExternalIdentity, GatewayOrder, GatewayPayment, IdentityProvider,
    LocalObjectStorage, PaymentGateway, ProviderError,
};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_KEY_ID: &str = "rzp_test";
pub const TEST_KEY_SECRET: &str = "test_gateway_secret";
pub const TEST_PASSWORD: &str = "Passw0rd!";
pub const MULTIPART_BOUNDARY: &str = "----admission-test-boundary";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// In-process payment gateway. Orders get sequential ids; payments are
/// whatever the test registers with [`FakeGateway::add_payment`].
#[derive(Default)]
pub struct FakeGateway {
    next_order: AtomicUsize,
    orders: Mutex<Vec<CreateOrderRequest>>,
    payments: Mutex<HashMap<String, GatewayPayment>>,
    fail_fetch: AtomicBool,
}

impl FakeGateway {
    /// Register the payment the gateway reports for `payment_id`.
    pub fn add_payment(&self, payment_id: &str, order_id: &str, amount: i64, status: &str) {
        self.payments.lock().unwrap().insert(
            payment_id.to_string(),
            GatewayPayment {
                id: payment_id.to_string(),
                order_id: Some(order_id.to_string()),
                amount,
                currency: "INR".to_string(),
                status: status.to_string(),
                method: Some("upi".to_string()),
                created_at: Some(1_717_200_000),
                error_description: (status == "failed").then(|| "Card declined".to_string()),
            },
        );
    }

    /// Make every `fetch_payment` call fail as if the gateway were down.
    pub fn fail_fetches(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    pub fn order_requests(&self) -> Vec<CreateOrderRequest> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn key_id(&self) -> &str {
        TEST_KEY_ID
    }

    async fn create_order(&self, request: &CreateOrderRequest) -> Result<GatewayOrder, ProviderError> {
        let n = self.next_order.fetch_add(1, Ordering::SeqCst) + 1;
        self.orders.lock().unwrap().push(request.clone());
        Ok(GatewayOrder {
            id: format!("order_test_{n}"),
            amount: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            status: Some("created".to_string()),
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, ProviderError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ProviderError::Api {
                status: 503,
                body: "gateway unavailable".to_string(),
            });
        }
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| ProviderError::Api {
                status: 400,
                body: format!("The id provided does not exist: {payment_id}"),
            })
    }
}

/// Identity provider that accepts credentials of the form `valid:<email>`.
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn resolve(&self, credential: &str) -> Result<ExternalIdentity, ProviderError> {
        let email = credential
            .strip_prefix("valid:")
            .ok_or_else(|| ProviderError::InvalidCredential("token rejected".to_string()))?;
        Ok(ExternalIdentity {
            email: email.to_string(),
            display_name: Some("Google User".to_string()),
            external_id: format!("google-{email}"),
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults and fixed secrets.
pub fn test_config(upload_dir: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        session: SessionConfig {
            secret: "test-session-secret".to_string(),
            expiry_hours: 24,
            cookie_name: "admission_session".to_string(),
            cookie_secure: false,
        },
        gateway: GatewayConfig {
            key_id: TEST_KEY_ID.to_string(),
            key_secret: TEST_KEY_SECRET.to_string(),
            api_base_url: "http://gateway.invalid".to_string(),
            currency: "INR".to_string(),
        },
        fees: FeeSchedule::default(),
        google_client_id: "test-client-id".to_string(),
        tokeninfo_url: "http://identity.invalid".to_string(),
        upload_dir: upload_dir.to_string(),
        upload_public_base_url: "http://localhost:3000/uploads".to_string(),
        order_stale_after_mins: 30,
    }
}

/// A fully wired application plus handles to its fakes.
pub struct TestApp {
    router: Router,
    pub gateway: Arc<FakeGateway>,
    uploads: TempDir,
}

impl TestApp {
    /// A fresh handle to the router; each request consumes one.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Number of files object storage has written so far.
    pub fn stored_file_count(&self) -> usize {
        fn count(dir: &Path) -> usize {
            std::fs::read_dir(dir)
                .unwrap()
                .map(|entry| entry.unwrap().path())
                .map(|path| if path.is_dir() { count(&path) } else { 1 })
                .sum()
        }
        count(self.uploads.path())
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and in-process fakes for external collaborators.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let uploads = TempDir::new().unwrap();
    let upload_dir = uploads.path().to_string_lossy().to_string();
    let config = test_config(&upload_dir);
    let gateway = Arc::new(FakeGateway::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        payment_gateway: gateway.clone(),
        identity: Arc::new(FakeIdentity),
        storage: Arc::new(LocalObjectStorage::new(
            &upload_dir,
            &config.upload_public_base_url,
        )),
    };

    TestApp {
        router: build_app_router(state, &config),
        gateway,
        uploads,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn builder(method: Method, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, builder(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_with_cookie(app: Router, uri: &str, cookie: &str) -> Response<Body> {
    send(
        app,
        builder(Method::GET, uri, Some(cookie))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, None)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_with_cookie(
    app: Router,
    uri: &str,
    cookie: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, Some(cookie))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_multipart(
    app: Router,
    uri: &str,
    cookie: &str,
    body: Vec<u8>,
) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, Some(cookie))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// The `name=value` pair from the response's `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response must set a cookie")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().trim().to_string()
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

/// A `multipart/form-data` body delimited by [`MULTIPART_BOUNDARY`].
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn personal_details_json() -> String {
    serde_json::json!({
        "candidateDetails": {
            "name": "Asha",
            "lastName": "Verma",
            "gender": "Female",
            "dateOfBirth": "2004-05-17"
        },
        "parentsDetails": {
            "fatherName": "Ravi Verma",
            "fatherPhone": "9811111111"
        },
        "address": {
            "fullAddress": "12 MG Road",
            "state": "Delhi",
            "city": "New Delhi",
            "pincode": "110001"
        }
    })
    .to_string()
}

pub fn qualification_details_json() -> String {
    serde_json::json!({
        "highSchool": {
            "board": "CBSE",
            "schoolName": "Springdale",
            "rollNumber": "10234",
            "passingYear": 2020,
            "percentage": 88.4
        },
        "intermediate": {
            "board": "CBSE",
            "schoolName": "Springdale",
            "rollNumber": "12234",
            "passingYear": 2022,
            "percentage": 91.0
        },
        "higherEducation": []
    })
    .to_string()
}

/// Register a credential applicant and return their session cookie.
pub async fn register(app: &TestApp, email: &str, phone: &str) -> String {
    let body = serde_json::json!({
        "name": "Asha Verma",
        "email": email,
        "phone": phone,
        "course": "MBA (Co-Ed)",
        "password": TEST_PASSWORD,
        "confirmPassword": TEST_PASSWORD,
    });
    let response = post_json(app.router(), "/api/v1/register", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    session_cookie(&response)
}

/// Submit one wizard section, returning the response.
pub async fn submit(app: &TestApp, cookie: &str, body: MultipartBody) -> Response<Body> {
    post_multipart(app.router(), "/api/v1/application/update", cookie, body.finish()).await
}

/// Complete all three wizard sections.
pub async fn complete_wizard(app: &TestApp, cookie: &str) {
    let steps = [
        MultipartBody::default().text("personalDetails", &personal_details_json()),
        MultipartBody::default().text("qualificationDetails", &qualification_details_json()),
        MultipartBody::default().file("profileImage", "me.png", "image/png", b"\x89PNG fake"),
    ];
    for body in steps {
        let response = submit(app, cookie, body).await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}

/// Create an order of `payment_type` and return its gateway order id.
pub async fn create_order(app: &TestApp, cookie: &str, payment_type: &str) -> String {
    let response = post_json_with_cookie(
        app.router(),
        "/api/v1/payment/create",
        cookie,
        serde_json::json!({ "type": payment_type }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["order"]["id"].as_str().unwrap().to_string()
}

/// Checkout signature as the gateway would compute it.
pub fn sign(order_id: &str, payment_id: &str) -> String {
    admission_core::payment::compute_signature(TEST_KEY_SECRET, order_id, payment_id).unwrap()
}

/// Pay for an order: register a captured gateway payment and verify it.
pub async fn pay(
    app: &TestApp,
    cookie: &str,
    payment_type: &str,
    order_id: &str,
    payment_id: &str,
    amount_paise: i64,
) -> Response<Body> {
    app.gateway
        .add_payment(payment_id, order_id, amount_paise, "captured");
    post_json_with_cookie(
        app.router(),
        "/api/v1/payment/verify",
        cookie,
        serde_json::json!({
            "type": payment_type,
            "razorpay_order_id": order_id,
            "razorpay_payment_id": payment_id,
            "razorpay_signature": sign(order_id, payment_id),
        }),
    )
    .await
}
