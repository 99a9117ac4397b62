//! Driving port for boat reads.
//!
//! `viewer` is `None` for anonymous callers. Private boats are only visible
//! to their owner and read as `not_found` to everyone else.

use async_trait::async_trait;

use crate::domain::{Boat, BoatId, Error, HydratedBoat, Load, PageRequest, Principal, RecordPage};

/// Use-case port for listing and fetching boats.
#[async_trait]
pub trait BoatsQuery: Send + Sync {
    /// The viewer's own boats, or public boats for anonymous callers.
    async fn list(
        &self,
        viewer: Option<&Principal>,
        page: PageRequest,
    ) -> Result<RecordPage<Boat>, Error>;

    /// A single boat with its load references verified against the loads.
    async fn fetch(&self, viewer: Option<&Principal>, id: BoatId) -> Result<HydratedBoat, Error>;

    /// Full records of the loads a visible boat carries.
    async fn loads_on_boat(
        &self,
        viewer: Option<&Principal>,
        id: BoatId,
    ) -> Result<Vec<Load>, Error>;
}
