//! Row models and write DTOs, one module per table.

pub mod applicant;
pub mod application;
pub mod payment;
pub mod payment_order;
pub mod session;
