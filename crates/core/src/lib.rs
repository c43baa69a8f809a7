//! Domain rules for the admission portal.
//!
//! Everything in this crate is pure: no database, network or filesystem
//! access. The `db`, `providers` and `api` crates build on these types.

pub mod applicant;
pub mod course;
pub mod error;
pub mod forms;
pub mod hashing;
pub mod payment;
pub mod pdf;
pub mod receipt;
pub mod sections;
pub mod types;
