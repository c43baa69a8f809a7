//! Applicant authentication: password hashing, session tokens and the
//! session cookie.

pub mod cookie;
pub mod password;
pub mod session;
