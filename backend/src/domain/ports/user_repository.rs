//! Port abstraction for user persistence adapters.
use async_trait::async_trait;

use crate::domain::{NewUser, PageRequest, RecordPage, Subject, User};

use super::RecordStoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identity subject.
    async fn find_by_sub(&self, sub: &Subject) -> Result<Option<User>, RecordStoreError>;

    /// Insert a new user; fails with [`RecordStoreError::Duplicate`] when the
    /// subject is already registered.
    async fn insert(&self, user: NewUser) -> Result<User, RecordStoreError>;

    /// Page through users in ascending key order.
    async fn list(&self, page: PageRequest) -> Result<RecordPage<User>, RecordStoreError>;
}
