//! Driving port for moving loads on and off boats.

use async_trait::async_trait;

use crate::domain::{BoatId, Error, LoadId, Principal};

/// Use-case port for the boat/load assignment engine.
///
/// `None` stands for an id that no record can have, such as a malformed path
/// segment. It is reported as missing alongside any genuinely absent record.
#[async_trait]
pub trait AssignmentCommand: Send + Sync {
    /// Put `load` on `boat`.
    ///
    /// Fails with `not_found` naming the missing records and with `conflict`
    /// when the load is already carried by any boat.
    async fn assign(
        &self,
        principal: &Principal,
        boat: Option<BoatId>,
        load: Option<LoadId>,
    ) -> Result<(), Error>;

    /// Take `load` off `boat`; `conflict` when the load is not on that boat.
    async fn unassign(
        &self,
        principal: &Principal,
        boat: Option<BoatId>,
        load: Option<LoadId>,
    ) -> Result<(), Error>;
}
