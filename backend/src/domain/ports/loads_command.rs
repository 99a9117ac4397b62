//! Driving port for load mutations. `carrier` is never writable here.

use async_trait::async_trait;

use crate::domain::{Error, Load, LoadDraft, LoadId, LoadPatch, Principal};

/// Use-case port for creating and editing loads.
#[async_trait]
pub trait LoadsCommand: Send + Sync {
    /// Create an unassigned load.
    async fn create(&self, principal: &Principal, draft: LoadDraft) -> Result<Load, Error>;

    /// Replace every descriptive field of a load.
    async fn replace(
        &self,
        principal: &Principal,
        id: LoadId,
        draft: LoadDraft,
    ) -> Result<Load, Error>;

    /// Update the fields present in `patch`.
    async fn patch(&self, principal: &Principal, id: LoadId, patch: LoadPatch)
    -> Result<Load, Error>;

    /// Delete a load that is not on a boat.
    async fn delete(&self, principal: &Principal, id: LoadId) -> Result<(), Error>;
}
