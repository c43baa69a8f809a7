//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod applicant_repo;
pub mod application_repo;
pub mod payment_order_repo;
pub mod payment_repo;
pub mod session_repo;

pub use applicant_repo::ApplicantRepo;
pub use application_repo::ApplicationRepo;
pub use payment_order_repo::PaymentOrderRepo;
pub use payment_repo::PaymentRepo;
pub use session_repo::SessionRepo;
