//! Boat/load assignment engine.
//!
//! A load's `carrier` and a boat's `loads` list describe the same
//! relationship from both ends, and the store cannot update both in one
//! transaction. The engine writes the boat first and the load second, each
//! as a compare-and-swap on the version it read. When the second write fails,
//! or the first one times out and may have landed, the engine repairs the
//! boat from the load's current carrier before reporting the failure, so a
//! lost race never leaves a boat claiming a load it does not carry.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{join, join_all};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::ports::{AssignmentCommand, BoatRepository, LoadRepository, RecordStoreError};
use super::{
    Boat, BoatId, Error, HydratedBoat, Load, LoadId, Principal, StoreCallPolicy, Subject,
};

/// CAS attempts a pair repair makes before giving up.
pub(crate) const REPAIR_ATTEMPTS: u32 = 3;

/// Which side of a requested pair does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingRecord {
    /// Only the boat is missing.
    Boat,
    /// Only the load is missing.
    Load,
    /// Neither record exists.
    Both,
}

impl MissingRecord {
    fn labels(self) -> &'static [&'static str] {
        match self {
            Self::Boat => &["boat"],
            Self::Load => &["load"],
            Self::Both => &["boat", "load"],
        }
    }
}

/// Why an assignment or unassignment was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentError {
    /// One or both records do not exist.
    #[error("requested records do not exist: {missing:?}")]
    NotFound { missing: MissingRecord },
    /// The load already rides the requested boat.
    #[error("load is already assigned to this boat")]
    AlreadyAssignedHere,
    /// The load rides a different boat.
    #[error("load is already assigned to another boat")]
    AssignedElsewhere,
    /// The load is not carried by the requested boat.
    #[error("load is not on this boat")]
    NotOnThisBoat,
    /// A compare-and-swap write lost to a concurrent change.
    #[error("boat or load was modified concurrently")]
    ConcurrentModification,
    /// The record store failed.
    #[error(transparent)]
    Store(#[from] RecordStoreError),
}

impl From<AssignmentError> for Error {
    fn from(value: AssignmentError) -> Self {
        match value {
            AssignmentError::NotFound { missing } => {
                let message = match missing {
                    MissingRecord::Boat => "boat not found",
                    MissingRecord::Load => "load not found",
                    MissingRecord::Both => "boat and load not found",
                };
                Error::not_found(message).with_details(json!({ "missing": missing.labels() }))
            }
            AssignmentError::AlreadyAssignedHere => {
                Error::conflict("load is already assigned to this boat")
                    .with_details(json!({ "code": "already_assigned_here" }))
            }
            AssignmentError::AssignedElsewhere => {
                Error::conflict("load is already assigned to another boat")
                    .with_details(json!({ "code": "assigned_elsewhere" }))
            }
            AssignmentError::NotOnThisBoat => Error::conflict("load is not on this boat")
                .with_details(json!({ "code": "not_on_this_boat" })),
            AssignmentError::ConcurrentModification => {
                Error::conflict("boat or load was modified concurrently, retry the request")
                    .with_details(json!({ "code": "concurrent_modification" }))
            }
            AssignmentError::Store(store) => store.into(),
        }
    }
}

/// Result of re-aligning one boat with one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRepair {
    /// The boat already agreed with the load's carrier.
    Consistent,
    /// The boat's reference was added or removed.
    Repaired,
    /// The boat no longer exists; nothing to align.
    BoatMissing,
}

/// Assignment engine over boat and load repositories.
pub struct AssignmentService<B, L> {
    pub(crate) boats: Arc<B>,
    pub(crate) loads: Arc<L>,
    pub(crate) policy: StoreCallPolicy,
}

impl<B, L> Clone for AssignmentService<B, L> {
    fn clone(&self) -> Self {
        Self {
            boats: Arc::clone(&self.boats),
            loads: Arc::clone(&self.loads),
            policy: self.policy.clone(),
        }
    }
}

impl<B, L> AssignmentService<B, L> {
    /// Create the engine.
    pub fn new(boats: Arc<B>, loads: Arc<L>, policy: StoreCallPolicy) -> Self {
        Self {
            boats,
            loads,
            policy,
        }
    }
}

impl<B, L> AssignmentService<B, L>
where
    B: BoatRepository,
    L: LoadRepository,
{
    pub(crate) async fn read_boat(&self, id: BoatId) -> Result<Option<Boat>, RecordStoreError> {
        self.policy
            .read("boats.find_by_id", || self.boats.find_by_id(id))
            .await
    }

    pub(crate) async fn read_load(&self, id: LoadId) -> Result<Option<Load>, RecordStoreError> {
        self.policy
            .read("loads.find_by_id", || self.loads.find_by_id(id))
            .await
    }

    pub(crate) async fn write_boat(&self, boat: &Boat) -> Result<Boat, RecordStoreError> {
        self.policy
            .write("boats.update", || self.boats.update(boat))
            .await
    }

    pub(crate) async fn write_load(&self, load: &Load) -> Result<Load, RecordStoreError> {
        self.policy
            .write("loads.update", || self.loads.update(load))
            .await
    }

    async fn read_pair(
        &self,
        boat_id: BoatId,
        load_id: LoadId,
    ) -> Result<(Boat, Load), AssignmentError> {
        let (boat, load) = join(self.read_boat(boat_id), self.read_load(load_id)).await;
        match (boat?, load?) {
            (Some(boat), Some(load)) => Ok((boat, load)),
            (None, None) => Err(AssignmentError::NotFound {
                missing: MissingRecord::Both,
            }),
            (None, Some(_)) => Err(AssignmentError::NotFound {
                missing: MissingRecord::Boat,
            }),
            (Some(_), None) => Err(AssignmentError::NotFound {
                missing: MissingRecord::Load,
            }),
        }
    }

    /// Resolve ids that may not name any record, reporting every side that
    /// is missing.
    async fn known_ids(
        &self,
        boat: Option<BoatId>,
        load: Option<LoadId>,
    ) -> Result<(BoatId, LoadId), AssignmentError> {
        let missing = match (boat, load) {
            (Some(boat), Some(load)) => return Ok((boat, load)),
            (None, None) => MissingRecord::Both,
            (None, Some(load)) => match self.read_load(load).await? {
                Some(_) => MissingRecord::Boat,
                None => MissingRecord::Both,
            },
            (Some(boat), None) => match self.read_boat(boat).await? {
                Some(_) => MissingRecord::Load,
                None => MissingRecord::Both,
            },
        };
        Err(AssignmentError::NotFound { missing })
    }

    /// Put `load_id` on `boat_id`.
    pub async fn assign_load(
        &self,
        boat_id: BoatId,
        load_id: LoadId,
    ) -> Result<(), AssignmentError> {
        let (mut boat, mut load) = self.read_pair(boat_id, load_id).await?;
        match load.carrier {
            Some(carrier) if carrier == boat_id => return Err(AssignmentError::AlreadyAssignedHere),
            Some(_) => return Err(AssignmentError::AssignedElsewhere),
            None => {}
        }

        if boat.attach(load_id) {
            self.persist_boat(&boat, load_id).await?;
        }
        load.carrier = Some(boat_id);
        self.persist_load_or_repair(&load, boat_id).await
    }

    /// Take `load_id` off `boat_id`.
    pub async fn unassign_load(
        &self,
        boat_id: BoatId,
        load_id: LoadId,
    ) -> Result<(), AssignmentError> {
        let (mut boat, mut load) = self.read_pair(boat_id, load_id).await?;
        if !load.is_carried_by(boat_id) {
            return Err(AssignmentError::NotOnThisBoat);
        }

        if boat.detach(load_id) {
            self.persist_boat(&boat, load_id).await?;
        }
        load.carrier = None;
        self.persist_load_or_repair(&load, boat_id).await
    }

    /// Write the boat side of a pair change.
    ///
    /// A conflict or a vanished boat means nothing landed. Any other failure
    /// leaves the write's outcome unknown, so the pair is repaired from the
    /// load before the failure is reported.
    async fn persist_boat(&self, boat: &Boat, load_id: LoadId) -> Result<(), AssignmentError> {
        let failure = match self.write_boat(boat).await {
            Ok(_) => return Ok(()),
            Err(failure) => failure,
        };
        match failure {
            RecordStoreError::VersionConflict { .. } => Err(AssignmentError::ConcurrentModification),
            RecordStoreError::Missing { .. } => Err(AssignmentError::NotFound {
                missing: MissingRecord::Boat,
            }),
            other => {
                warn!(
                    boat_id = %boat.id,
                    load_id = %load_id,
                    error = %other,
                    "boat write outcome unknown; repairing pair"
                );
                self.repair_or_log(boat.id, load_id).await;
                Err(other.into())
            }
        }
    }

    async fn persist_load_or_repair(
        &self,
        load: &Load,
        boat_id: BoatId,
    ) -> Result<(), AssignmentError> {
        let failure = match self.write_load(load).await {
            Ok(_) => return Ok(()),
            Err(failure) => failure,
        };
        warn!(
            boat_id = %boat_id,
            load_id = %load.id,
            error = %failure,
            "load write failed after boat write; repairing pair"
        );
        self.repair_or_log(boat_id, load.id).await;
        Err(match failure {
            RecordStoreError::VersionConflict { .. } => AssignmentError::ConcurrentModification,
            RecordStoreError::Missing { .. } => AssignmentError::NotFound {
                missing: MissingRecord::Load,
            },
            other => other.into(),
        })
    }

    async fn repair_or_log(&self, boat_id: BoatId, load_id: LoadId) {
        if let Err(repair_error) = self.repair_pair(boat_id, load_id).await {
            error!(
                boat_id = %boat_id,
                load_id = %load_id,
                error = %repair_error,
                "pair repair failed; boat and load disagree until reconciliation"
            );
        }
    }

    /// Make the boat's `loads` agree with the load's current `carrier`.
    ///
    /// The load is authoritative: the boat holds the reference iff the load
    /// names it as carrier. Retries lost CAS races up to a small bound.
    pub async fn repair_pair(
        &self,
        boat_id: BoatId,
        load_id: LoadId,
    ) -> Result<PairRepair, RecordStoreError> {
        for attempt in 1..=REPAIR_ATTEMPTS {
            let carried_here = self
                .read_load(load_id)
                .await?
                .is_some_and(|load| load.is_carried_by(boat_id));
            let Some(mut boat) = self.read_boat(boat_id).await? else {
                return Ok(PairRepair::BoatMissing);
            };
            let changed = if carried_here {
                boat.attach(load_id)
            } else {
                boat.detach(load_id)
            };
            if !changed {
                return Ok(PairRepair::Consistent);
            }
            match self.write_boat(&boat).await {
                Ok(_) => {
                    info!(boat_id = %boat_id, load_id = %load_id, carried_here, "pair repaired");
                    return Ok(PairRepair::Repaired);
                }
                Err(RecordStoreError::VersionConflict { .. }) => {
                    debug!(boat_id = %boat_id, attempt, "boat moved during repair; re-reading");
                }
                Err(RecordStoreError::Missing { .. }) => return Ok(PairRepair::BoatMissing),
                Err(other) => return Err(other),
            }
        }
        Err(RecordStoreError::version_conflict(format!("boat {boat_id}")))
    }

    /// Fetch a boat the viewer may see and verify its load references.
    pub async fn fetch_boat_with_loads(
        &self,
        viewer: Option<&Subject>,
        boat_id: BoatId,
    ) -> Result<HydratedBoat, Error> {
        let boat = self
            .read_boat(boat_id)
            .await?
            .filter(|boat| boat.is_visible_to(viewer))
            .ok_or_else(|| Error::not_found("boat not found"))?;
        Ok(self.hydrate(boat).await?)
    }

    /// Resolve every load reference on `boat`.
    ///
    /// References to loads that no longer exist are dropped from the result
    /// and from the stored boat. References to loads that name another
    /// carrier are dropped from the result only: an assignment in flight
    /// passes through that state, and reconciliation settles it otherwise.
    pub async fn hydrate(&self, boat: Boat) -> Result<HydratedBoat, RecordStoreError> {
        let reads = boat.loads.iter().map(|id| self.read_load(*id));
        let resolved = join_all(reads).await;

        let mut loads = Vec::with_capacity(resolved.len());
        let mut dangling = Vec::new();
        for (id, result) in boat.loads.iter().zip(resolved) {
            match result? {
                Some(load) if load.is_carried_by(boat.id) => loads.push(load),
                Some(load) => debug!(
                    boat_id = %boat.id,
                    load_id = %id,
                    carrier = ?load.carrier.map(|c| c.get()),
                    "boat references a load carried elsewhere; omitted"
                ),
                None => dangling.push(*id),
            }
        }

        if dangling.is_empty() {
            return Ok(HydratedBoat { boat, loads });
        }
        warn!(
            boat_id = %boat.id,
            dangling = ?dangling.iter().map(|id| id.get()).collect::<Vec<_>>(),
            "boat references deleted loads; healing"
        );
        let boat = self.heal_dangling(boat, &dangling).await;
        Ok(HydratedBoat { boat, loads })
    }

    async fn heal_dangling(&self, boat: Boat, dangling: &[LoadId]) -> Boat {
        let mut healed = boat.clone();
        for id in dangling {
            healed.detach(*id);
        }
        match self.write_boat(&healed).await {
            Ok(stored) => stored,
            Err(error) => {
                warn!(boat_id = %boat.id, %error, "could not heal boat; left for reconciliation");
                boat
            }
        }
    }
}

#[async_trait]
impl<B, L> AssignmentCommand for AssignmentService<B, L>
where
    B: BoatRepository,
    L: LoadRepository,
{
    async fn assign(
        &self,
        principal: &Principal,
        boat: Option<BoatId>,
        load: Option<LoadId>,
    ) -> Result<(), Error> {
        let (boat, load) = self.known_ids(boat, load).await?;
        self.assign_load(boat, load).await?;
        info!(sub = %principal.sub(), boat_id = %boat, load_id = %load, "load assigned");
        Ok(())
    }

    async fn unassign(
        &self,
        principal: &Principal,
        boat: Option<BoatId>,
        load: Option<LoadId>,
    ) -> Result<(), Error> {
        let (boat, load) = self.known_ids(boat, load).await?;
        self.unassign_load(boat, load).await?;
        info!(sub = %principal.sub(), boat_id = %boat, load_id = %load, "load unassigned");
        Ok(())
    }
}

#[cfg(test)]
#[path = "assignment_service_tests.rs"]
mod tests;
