//! Driving port for user-facing queries.

use async_trait::async_trait;

use crate::domain::{Error, PageRequest, Principal, RecordPage, User};

/// Domain use-case port for reading users.
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Page through registered users.
    async fn list(&self, page: PageRequest) -> Result<RecordPage<User>, Error>;

    /// The user record of the authenticated caller.
    async fn current(&self, principal: &Principal) -> Result<User, Error>;
}
