//! Driving port for boat mutations.

use async_trait::async_trait;

use crate::domain::{Boat, BoatDraft, BoatId, BoatPatch, Error, Principal};

/// Use-case port for creating and editing boats. Only the owner may edit.
#[async_trait]
pub trait BoatsCommand: Send + Sync {
    /// Create a boat owned by `principal`; names are unique.
    async fn create(&self, principal: &Principal, draft: BoatDraft) -> Result<Boat, Error>;

    /// Replace every descriptive field of a boat.
    async fn replace(
        &self,
        principal: &Principal,
        id: BoatId,
        draft: BoatDraft,
    ) -> Result<Boat, Error>;

    /// Update the fields present in `patch`.
    async fn patch(&self, principal: &Principal, id: BoatId, patch: BoatPatch)
    -> Result<Boat, Error>;

    /// Delete a boat that carries no loads.
    async fn delete(&self, principal: &Principal, id: BoatId) -> Result<(), Error>;
}
