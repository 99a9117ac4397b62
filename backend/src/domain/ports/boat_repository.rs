//! Driven port for boat storage.
//!
//! Every write is compare-and-swap on the record version. The store offers
//! no multi-record transaction; keeping boats and loads in agreement is the
//! assignment engine's job.

use async_trait::async_trait;

use crate::domain::{Boat, BoatDraft, BoatId, BoatName, PageRequest, RecordPage, Subject, Version};

use super::RecordStoreError;

/// Which boats a listing returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoatFilter {
    /// Boats created by the given subject, public or not.
    OwnedBy(Subject),
    /// Public boats only.
    Public,
    /// Every boat; used by maintenance passes.
    All,
}

impl BoatFilter {
    /// Whether `boat` passes the filter.
    #[must_use]
    pub fn matches(&self, boat: &Boat) -> bool {
        match self {
            Self::OwnedBy(sub) => boat.is_owned_by(sub),
            Self::Public => boat.public,
            Self::All => true,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoatRepository: Send + Sync {
    /// Point read by key.
    async fn find_by_id(&self, id: BoatId) -> Result<Option<Boat>, RecordStoreError>;

    /// Boats whose name matches exactly.
    async fn find_by_name(&self, name: &BoatName) -> Result<Vec<Boat>, RecordStoreError>;

    /// Store a new boat for `owner`, returning it with its assigned key.
    async fn insert(&self, owner: &Subject, draft: BoatDraft) -> Result<Boat, RecordStoreError>;

    /// Overwrite `boat` if the stored version still equals `boat.version`.
    ///
    /// Returns the record as stored, carrying its bumped version. Fails with
    /// [`RecordStoreError::VersionConflict`] on a stale version and
    /// [`RecordStoreError::Missing`] when the boat no longer exists.
    async fn update(&self, boat: &Boat) -> Result<Boat, RecordStoreError>;

    /// Delete the boat if the stored version still equals `expected`.
    async fn delete(&self, id: BoatId, expected: Version) -> Result<(), RecordStoreError>;

    /// Page through boats matching `filter` in ascending key order.
    async fn list(
        &self,
        filter: &BoatFilter,
        page: PageRequest,
    ) -> Result<RecordPage<Boat>, RecordStoreError>;
}
