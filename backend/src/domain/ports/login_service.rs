//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters call it to turn an identity token into a principal
//! without knowing which provider verifies it.

use async_trait::async_trait;

use crate::domain::{Error, IdToken, Principal, User};

/// Domain use-case port for authentication.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Verify `token`, registering the user on first login.
    async fn login(&self, token: &IdToken) -> Result<User, Error>;

    /// Verify `token` for a single request without touching user records.
    async fn authenticate(&self, token: &IdToken) -> Result<Principal, Error>;
}
