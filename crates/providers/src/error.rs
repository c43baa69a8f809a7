/// Errors from external collaborators (payment gateway, identity provider,
/// object storage).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The identity credential was malformed, expired or issued for another
    /// client.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Local storage I/O failed.
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The request was refused before reaching the provider.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Return the response unchanged on a 2xx status, otherwise an
/// [`ProviderError::Api`] carrying the status and body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}
