//! Driven port verifying identity tokens with an external provider.

use async_trait::async_trait;

use crate::domain::{Error, IdToken, IdentityClaims, Subject};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity verification adapters.
    pub enum IdentityError {
        /// The provider does not vouch for the token.
        Rejected { reason: String } => "identity token rejected: {reason}",
        /// The provider could not be reached or answered unexpectedly.
        Unavailable { message: String } => "identity provider unavailable: {message}",
    }
}

impl From<IdentityError> for Error {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::Rejected { .. } => Error::unauthorized("invalid identity token"),
            IdentityError::Unavailable { .. } => {
                Error::service_unavailable("identity provider unavailable, retry later")
            }
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the claims the provider vouches for.
    async fn verify(&self, token: &IdToken) -> Result<IdentityClaims, IdentityError>;
}

/// Prefix every token accepted by [`FixtureIdentityVerifier`] carries.
pub const FIXTURE_TOKEN_PREFIX: &str = "fixture.";

/// Offline verifier for local runs and tests.
///
/// Accepts tokens shaped `fixture.<sub>[.<given name>[.<family name>]]` and
/// rejects everything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityVerifier;

#[async_trait]
impl IdentityVerifier for FixtureIdentityVerifier {
    async fn verify(&self, token: &IdToken) -> Result<IdentityClaims, IdentityError> {
        let body = token
            .expose()
            .strip_prefix(FIXTURE_TOKEN_PREFIX)
            .ok_or_else(|| IdentityError::rejected("not a fixture token"))?;
        let mut parts = body.splitn(3, '.');
        let sub = parts
            .next()
            .and_then(|raw| Subject::new(raw).ok())
            .ok_or_else(|| IdentityError::rejected("fixture token has no subject"))?;
        let given_name = parts.next().unwrap_or("Fixture").to_owned();
        let family_name = parts.next().unwrap_or("User").to_owned();
        Ok(IdentityClaims {
            sub,
            given_name,
            family_name,
        })
    }
}
