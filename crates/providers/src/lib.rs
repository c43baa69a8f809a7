//! External collaborators of the admission portal.
//!
//! Each collaborator sits behind an object-safe trait so the API layer can
//! hold it as `Arc<dyn ...>` and tests can substitute in-process fakes.

pub mod error;
pub mod identity;
pub mod payment;
pub mod storage;

pub use error::ProviderError;
pub use identity::{ExternalIdentity, GoogleIdentityProvider, IdentityProvider};
pub use payment::{CreateOrderRequest, GatewayOrder, GatewayPayment, PaymentGateway, RazorpayGateway};
pub use storage::{LocalObjectStorage, ObjectStorage, UploadedFile};
