use std::sync::Arc;

use admission_providers::{IdentityProvider, ObjectStorage, PaymentGateway};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: admission_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Payment gateway client (orders and payment lookups).
    pub payment_gateway: Arc<dyn PaymentGateway>,
    /// External identity provider (sign-in credentials).
    pub identity: Arc<dyn IdentityProvider>,
    /// Storage for uploaded documents.
    pub storage: Arc<dyn ObjectStorage>,
}
