//! External identity provider.
//!
//! Exchanges a Google ID token (the credential the browser sign-in button
//! returns) for the applicant's verified email, display name and subject id.
//! Verification is delegated to Google's `tokeninfo` endpoint; the audience
//! must match the configured OAuth client id.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{parse_response, ProviderError};

/// Default Google token verification endpoint.
pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity resolved from an external credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Verified email, lower-cased.
    pub email: String,
    pub display_name: Option<String>,
    /// Provider-scoped subject id.
    pub external_id: String,
}

/// Identity provider seam.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a credential into an identity, rejecting anything that does
    /// not verify.
    async fn resolve(&self, credential: &str) -> Result<ExternalIdentity, ProviderError>;
}

/// Claims returned by the `tokeninfo` endpoint. Google encodes booleans as
/// strings here, so `email_verified` accepts both.
#[derive(Debug, Deserialize)]
pub struct TokenInfo {
    pub aud: String,
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<serde_json::Value>,
    #[serde(default)]
    pub name: Option<String>,
}

impl TokenInfo {
    fn email_is_verified(&self) -> bool {
        match &self.email_verified {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        }
    }

    /// Validate the claims for `client_id` and extract the identity.
    pub fn into_identity(self, client_id: &str) -> Result<ExternalIdentity, ProviderError> {
        if self.aud != client_id {
            return Err(ProviderError::InvalidCredential(
                "Token was issued for a different client".into(),
            ));
        }
        if !self.email_is_verified() {
            return Err(ProviderError::InvalidCredential(
                "Email address is not verified".into(),
            ));
        }
        let email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ProviderError::InvalidCredential("Token carries no email".into()))?;

        Ok(ExternalIdentity {
            email,
            display_name: self.name.filter(|n| !n.trim().is_empty()),
            external_id: self.sub,
        })
    }
}

/// Google ID-token verifier.
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    tokeninfo_url: String,
    client_id: String,
}

impl GoogleIdentityProvider {
    pub fn new(client: reqwest::Client, tokeninfo_url: String, client_id: String) -> Self {
        Self {
            client,
            tokeninfo_url,
            client_id,
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn resolve(&self, credential: &str) -> Result<ExternalIdentity, ProviderError> {
        if credential.trim().is_empty() {
            return Err(ProviderError::InvalidCredential("Credential is empty".into()));
        }

        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", credential)])
            .send()
            .await?;

        // tokeninfo answers 400 for expired or forged tokens.
        let info: TokenInfo = match parse_response(response).await {
            Err(ProviderError::Api { status: 400, .. }) => {
                return Err(ProviderError::InvalidCredential(
                    "Credential could not be verified".into(),
                ))
            }
            other => other?,
        };

        info.into_identity(&self.client_id)
    }
}
