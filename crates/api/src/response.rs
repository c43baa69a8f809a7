//! Shared response envelope.

use serde::Serialize;

/// Standard `{ "data": ... }` envelope for successful API responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
