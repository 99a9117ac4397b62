//! Driven port for load storage.

use async_trait::async_trait;

use crate::domain::{Load, LoadDraft, LoadId, PageRequest, RecordPage, Version};

use super::RecordStoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoadRepository: Send + Sync {
    /// Point read by key.
    async fn find_by_id(&self, id: LoadId) -> Result<Option<Load>, RecordStoreError>;

    /// Store a new, unassigned load, returning it with its assigned key.
    async fn insert(&self, draft: LoadDraft) -> Result<Load, RecordStoreError>;

    /// Overwrite `load` if the stored version still equals `load.version`.
    ///
    /// Returns the record as stored with its bumped version.
    async fn update(&self, load: &Load) -> Result<Load, RecordStoreError>;

    /// Delete the load if the stored version still equals `expected`.
    async fn delete(&self, id: LoadId, expected: Version) -> Result<(), RecordStoreError>;

    /// Page through all loads in ascending key order.
    async fn list(&self, page: PageRequest) -> Result<RecordPage<Load>, RecordStoreError>;
}
