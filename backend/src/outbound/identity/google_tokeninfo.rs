//! Reqwest-backed Google ID token verifier.
//!
//! Verification is delegated to Google's token-info endpoint; this adapter
//! owns transport details only: the request, timeout and status mapping, and
//! the issuer/audience checks on the decoded claims.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::TokenInfoDto;
use crate::domain::ports::{IdentityError, IdentityVerifier};
use crate::domain::{IdToken, IdentityClaims};

/// Google's public token-info endpoint.
pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity verifier that asks Google whether an ID token is genuine.
pub struct GoogleTokenInfoVerifier {
    client: Client,
    endpoint: Url,
    audience: String,
}

impl GoogleTokenInfoVerifier {
    /// Build a verifier for tokens issued to `audience` (the OAuth client id).
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        audience: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            audience: audience.into(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenInfoVerifier {
    async fn verify(&self, token: &IdToken) -> Result<IdentityClaims, IdentityError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("id_token", token.expose())])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status));
        }
        parse_claims(body.as_ref(), &self.audience)
    }
}

fn parse_claims(body: &[u8], audience: &str) -> Result<IdentityClaims, IdentityError> {
    let decoded: TokenInfoDto = serde_json::from_slice(body).map_err(|error| {
        IdentityError::unavailable(format!("invalid token-info payload: {error}"))
    })?;
    decoded.into_claims(audience).map_err(IdentityError::rejected)
}

fn map_transport_error(error: reqwest::Error) -> IdentityError {
    if error.is_timeout() {
        IdentityError::unavailable("token-info request timed out")
    } else {
        IdentityError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode) -> IdentityError {
    // Google answers 400 for malformed, expired or forged tokens.
    if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
        IdentityError::rejected(format!("token-info status {}", status.as_u16()))
    } else {
        IdentityError::unavailable(format!("token-info status {}", status.as_u16()))
    }
}
