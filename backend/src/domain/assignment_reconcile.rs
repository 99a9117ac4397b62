//! Whole-store reconciliation of boat load lists against load carriers.
//!
//! Carriers are authoritative. A pass rewrites every boat whose `loads`
//! disagree with the loads naming it as carrier, and clears carriers that
//! name boats which no longer exist. Boats that move while the pass runs are
//! skipped and counted; the next pass picks them up.
//!
//! An assignment in flight writes the boat before the load, so the scan can
//! see a reference whose load does not name the boat yet. Each dropped
//! reference to a live load is re-checked with [`AssignmentService::repair_pair`]
//! after the boat write; a carrier set in between restores the reference.
//! A carrier written after that re-check is left for the next pass.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{info, warn};

use super::ports::{BoatFilter, BoatRepository, LoadRepository, RecordStoreError};
use super::{AssignmentService, Boat, BoatId, Load, LoadId, PageRequest, PairRepair};

/// Page size used while scanning the store.
pub const RECONCILE_PAGE_SIZE: u32 = 100;

/// Counters describing one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Boats read by the pass.
    pub boats_scanned: u64,
    /// Loads read by the pass.
    pub loads_scanned: u64,
    /// References to loads that are missing or carried elsewhere.
    pub dangling_references_dropped: u64,
    /// Loads naming a boat that did not list them.
    pub missing_references_added: u64,
    /// Loads whose carrier no longer exists.
    pub orphaned_carriers_cleared: u64,
    /// Records that changed under the pass and were left alone.
    pub conflicts_skipped: u64,
}

impl ReconcileReport {
    /// Whether the pass changed nothing and skipped nothing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling_references_dropped == 0
            && self.missing_references_added == 0
            && self.orphaned_carriers_cleared == 0
            && self.conflicts_skipped == 0
    }
}

/// The load list `boat` should hold given the carriers in `loads`.
///
/// Keeps the boat's existing order for references that are still valid,
/// then appends loads it is missing in key order.
fn desired_loads(boat: &Boat, carried: &BTreeSet<LoadId>) -> (Vec<LoadId>, u64, u64) {
    let mut kept = Vec::with_capacity(carried.len());
    let mut dropped = 0;
    for id in &boat.loads {
        if carried.contains(id) && !kept.contains(id) {
            kept.push(*id);
        } else {
            dropped += 1;
        }
    }
    let mut added = 0;
    for id in carried {
        if !kept.contains(id) {
            kept.push(*id);
            added += 1;
        }
    }
    (kept, dropped, added)
}

impl<B, L> AssignmentService<B, L>
where
    B: BoatRepository,
    L: LoadRepository,
{
    async fn scan_boats(&self) -> Result<BTreeMap<BoatId, Boat>, RecordStoreError> {
        let filter = BoatFilter::All;
        let mut boats = BTreeMap::new();
        let mut page = PageRequest::first(RECONCILE_PAGE_SIZE);
        loop {
            let batch = self
                .policy
                .read("boats.list", || self.boats.list(&filter, page))
                .await?;
            page.after = batch.items.last().map(|boat| boat.id.get());
            boats.extend(batch.items.into_iter().map(|boat| (boat.id, boat)));
            if !batch.has_more || page.after.is_none() {
                return Ok(boats);
            }
        }
    }

    async fn scan_loads(&self) -> Result<BTreeMap<LoadId, Load>, RecordStoreError> {
        let mut loads = BTreeMap::new();
        let mut page = PageRequest::first(RECONCILE_PAGE_SIZE);
        loop {
            let batch = self
                .policy
                .read("loads.list", || self.loads.list(page))
                .await?;
            page.after = batch.items.last().map(|load| load.id.get());
            loads.extend(batch.items.into_iter().map(|load| (load.id, load)));
            if !batch.has_more || page.after.is_none() {
                return Ok(loads);
            }
        }
    }

    /// Re-align `boat` with every live load whose reference the pass dropped.
    ///
    /// Returns how many references came back because their load now names
    /// the boat.
    async fn recheck_dropped(
        &self,
        boat: &Boat,
        kept: &[LoadId],
        loads: &BTreeMap<LoadId, Load>,
    ) -> u64 {
        let mut restored = 0;
        let dropped = boat
            .loads
            .iter()
            .filter(|id| !kept.contains(id) && loads.contains_key(id));
        for load_id in dropped {
            match self.repair_pair(boat.id, *load_id).await {
                Ok(PairRepair::Repaired) => {
                    restored += 1;
                    info!(boat_id = %boat.id, load_id = %load_id, "kept reference of assignment in flight");
                }
                Ok(PairRepair::Consistent | PairRepair::BoatMissing) => {}
                Err(error) => {
                    warn!(boat_id = %boat.id, load_id = %load_id, %error, "re-check failed; next pass retries");
                }
            }
        }
        restored
    }

    /// Scan every boat and load and rewrite whatever disagrees.
    ///
    /// Store failures other than version conflicts abort the pass.
    pub async fn reconcile(&self) -> Result<ReconcileReport, RecordStoreError> {
        let boats = self.scan_boats().await?;
        let loads = self.scan_loads().await?;
        let mut report = ReconcileReport {
            boats_scanned: boats.len() as u64,
            loads_scanned: loads.len() as u64,
            ..ReconcileReport::default()
        };

        let mut carried: BTreeMap<BoatId, BTreeSet<LoadId>> = BTreeMap::new();
        for load in loads.values() {
            let Some(carrier) = load.carrier else {
                continue;
            };
            if boats.contains_key(&carrier) {
                carried.entry(carrier).or_default().insert(load.id);
                continue;
            }
            let mut orphan = load.clone();
            orphan.carrier = None;
            match self.write_load(&orphan).await {
                Ok(_) => {
                    report.orphaned_carriers_cleared += 1;
                    info!(load_id = %load.id, boat_id = %carrier, "cleared carrier of deleted boat");
                }
                Err(RecordStoreError::VersionConflict { .. } | RecordStoreError::Missing { .. }) => {
                    report.conflicts_skipped += 1;
                }
                Err(other) => return Err(other),
            }
        }

        let none = BTreeSet::new();
        for boat in boats.values() {
            let expected = carried.get(&boat.id).unwrap_or(&none);
            let (desired, dropped, added) = desired_loads(boat, expected);
            if desired == boat.loads {
                continue;
            }
            let mut fixed = boat.clone();
            fixed.loads = desired;
            match self.write_boat(&fixed).await {
                Ok(_) => {
                    let restored = self.recheck_dropped(boat, &fixed.loads, &loads).await;
                    report.dangling_references_dropped += dropped.saturating_sub(restored);
                    report.missing_references_added += added;
                    info!(boat_id = %boat.id, dropped, added, restored, "boat loads reconciled");
                }
                Err(RecordStoreError::VersionConflict { .. } | RecordStoreError::Missing { .. }) => {
                    report.conflicts_skipped += 1;
                    warn!(boat_id = %boat.id, "boat changed during reconciliation; skipped");
                }
                Err(other) => return Err(other),
            }
        }

        info!(
            boats = report.boats_scanned,
            loads = report.loads_scanned,
            clean = report.is_clean(),
            "reconciliation pass finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::NaiveDate;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{MockBoatRepository, MockLoadRepository};
    use crate::domain::{BoatDraft, NoJitter, RecordPage, StoreCallPolicy, Subject, Version};

    fn boat(id: i64, loads: &[i64]) -> Boat {
        let draft = BoatDraft::try_from_parts(format!("Boat {id}"), "Sloop", 10, true)
            .expect("draft");
        let mut boat = Boat::from_draft(
            BoatId::new(id).expect("id"),
            Subject::new("owner").expect("sub"),
            draft,
        );
        boat.loads = loads.iter().map(|raw| LoadId::new(*raw).expect("id")).collect();
        boat
    }

    fn load(id: i64, carrier: Option<i64>) -> Load {
        Load {
            id: LoadId::new(id).expect("id"),
            version: Version::INITIAL,
            volume: 1,
            content: "crates".to_owned(),
            creation_date: NaiveDate::from_ymd_opt(2024, 1, 2).expect("date"),
            carrier: carrier.and_then(BoatId::new),
        }
    }

    fn ids(raw: &[i64]) -> Vec<LoadId> {
        raw.iter().map(|id| LoadId::new(*id).expect("id")).collect()
    }

    fn single_page<T>(items: Vec<T>) -> RecordPage<T> {
        RecordPage {
            total: items.len() as u64,
            items,
            has_more: false,
        }
    }

    fn engine(
        boats: MockBoatRepository,
        loads: MockLoadRepository,
    ) -> AssignmentService<MockBoatRepository, MockLoadRepository> {
        let policy = StoreCallPolicy::new(Duration::from_millis(200), 1, Duration::ZERO)
            .with_jitter(Arc::new(NoJitter));
        AssignmentService::new(Arc::new(boats), Arc::new(loads), policy)
    }

    #[rstest]
    #[case(&[3, 9], &[3, 9], &[3, 9], 0, 0)]
    #[case(&[9, 3], &[3, 9], &[9, 3], 0, 0)]
    #[case(&[9, 4, 3], &[3, 9], &[9, 3], 1, 0)]
    #[case(&[9], &[3, 9, 12], &[9, 3, 12], 0, 2)]
    #[case(&[9, 9], &[9], &[9], 1, 0)]
    fn desired_loads_follow_carriers(
        #[case] held: &[i64],
        #[case] carried: &[i64],
        #[case] expected: &[i64],
        #[case] dropped: u64,
        #[case] added: u64,
    ) {
        let carried: BTreeSet<LoadId> = ids(carried).into_iter().collect();
        let outcome = desired_loads(&boat(1, held), &carried);
        assert_eq!(outcome, (ids(expected), dropped, added));
    }

    #[rstest]
    #[tokio::test]
    async fn pass_repairs_boats_and_orphaned_loads() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut boats = MockBoatRepository::new();
        boats
            .expect_list()
            .returning(|_, _| Ok(single_page(vec![boat(1, &[4, 5]), boat(2, &[6])])));
        let sink = Arc::clone(&written);
        boats.expect_update().times(1).returning(move |boat| {
            sink.lock().expect("lock").push(boat.clone());
            Ok(boat.clone())
        });
        let mut loads = MockLoadRepository::new();
        loads.expect_list().returning(|_| {
            Ok(single_page(vec![
                load(4, Some(1)),
                load(6, Some(2)),
                load(7, Some(1)),
                load(8, Some(99)),
            ]))
        });
        loads
            .expect_update()
            .withf(|load| load.id.get() == 8 && load.carrier.is_none())
            .times(1)
            .returning(|load| Ok(load.clone()));

        let report = engine(boats, loads).reconcile().await.expect("pass");

        assert_eq!(
            report,
            ReconcileReport {
                boats_scanned: 2,
                loads_scanned: 4,
                dangling_references_dropped: 1,
                missing_references_added: 1,
                orphaned_carriers_cleared: 1,
                conflicts_skipped: 0,
            }
        );
        let written = written.lock().expect("lock");
        assert_eq!(written[0].loads, ids(&[4, 7]));
    }

    #[rstest]
    #[case::carrier_landed(Some(1), &[4], 0)]
    #[case::still_unassigned(None, &[], 1)]
    #[tokio::test]
    async fn dropped_references_are_rechecked_against_the_load(
        #[case] carrier_after_scan: Option<i64>,
        #[case] final_loads: &[i64],
        #[case] dropped: u64,
    ) {
        let stored = Arc::new(Mutex::new(boat(1, &[4])));
        let mut boats = MockBoatRepository::new();
        boats
            .expect_list()
            .returning(|_, _| Ok(single_page(vec![boat(1, &[4])])));
        let reader = Arc::clone(&stored);
        boats
            .expect_find_by_id()
            .returning(move |_| Ok(Some(reader.lock().expect("lock").clone())));
        let writer = Arc::clone(&stored);
        boats.expect_update().returning(move |boat| {
            *writer.lock().expect("lock") = boat.clone();
            Ok(boat.clone())
        });
        let mut loads = MockLoadRepository::new();
        loads
            .expect_list()
            .returning(|_| Ok(single_page(vec![load(4, None)])));
        loads
            .expect_find_by_id()
            .returning(move |_| Ok(Some(load(4, carrier_after_scan))));

        let report = engine(boats, loads).reconcile().await.expect("pass");

        assert_eq!(report.dangling_references_dropped, dropped);
        assert_eq!(stored.lock().expect("lock").loads, ids(final_loads));
    }

    #[rstest]
    #[tokio::test]
    async fn conflicting_boats_are_skipped() {
        let mut boats = MockBoatRepository::new();
        boats
            .expect_list()
            .returning(|_, _| Ok(single_page(vec![boat(1, &[4])])));
        boats
            .expect_update()
            .returning(|_| Err(RecordStoreError::version_conflict("boat 1")));
        let mut loads = MockLoadRepository::new();
        loads.expect_list().returning(|_| Ok(single_page(Vec::new())));

        let report = engine(boats, loads).reconcile().await.expect("pass");
        assert_eq!(report.conflicts_skipped, 1);
        assert_eq!(report.dangling_references_dropped, 0);
        assert!(!report.is_clean());
    }

    #[rstest]
    #[tokio::test]
    async fn scans_follow_pages() {
        let mut boats = MockBoatRepository::new();
        boats.expect_list().returning(|_, page| {
            let items = match page.after {
                None => vec![boat(1, &[])],
                Some(_) => vec![boat(2, &[])],
            };
            Ok(RecordPage {
                items,
                total: 2,
                has_more: page.after.is_none(),
            })
        });
        let mut loads = MockLoadRepository::new();
        loads.expect_list().returning(|_| Ok(single_page(Vec::new())));

        let report = engine(boats, loads).reconcile().await.expect("pass");
        assert_eq!(report.boats_scanned, 2);
        assert!(report.is_clean());
    }

    #[rstest]
    #[tokio::test]
    async fn store_outages_abort_the_pass() {
        let mut boats = MockBoatRepository::new();
        boats
            .expect_list()
            .returning(|_, _| Err(RecordStoreError::connection("refused")));
        let err = engine(boats, MockLoadRepository::new())
            .reconcile()
            .await
            .expect_err("outage");
        assert!(err.is_transient());
    }
}
