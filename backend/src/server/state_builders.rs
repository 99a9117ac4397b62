//! Builders wiring repositories into the driving ports the handlers use.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use crate::domain::ports::{BoatRepository, IdentityVerifier, LoadRepository, UserRepository};
use crate::domain::{AssignmentService, BoatService, LoadService, StoreCallPolicy, UserService};
use crate::inbound::http::state::HttpStatePorts;
use crate::outbound::memory::MemoryRecordStore;
use crate::outbound::persistence::{
    DbPool, DieselBoatRepository, DieselLoadRepository, DieselUserRepository,
};

/// Record services over one set of repositories.
pub struct PortRepositories<B, L, U> {
    pub boats: Arc<B>,
    pub loads: Arc<L>,
    pub users: Arc<U>,
}

/// Build every driving port over `repos`.
///
/// The boat service and the assignment endpoints share one engine so both
/// sides of an assignment are written through the same policy.
pub fn build_ports<B, L, U>(
    repos: PortRepositories<B, L, U>,
    verifier: Arc<dyn IdentityVerifier>,
    clock: Arc<dyn Clock>,
    policy: StoreCallPolicy,
) -> HttpStatePorts
where
    B: BoatRepository + 'static,
    L: LoadRepository + 'static,
    U: UserRepository + 'static,
{
    let PortRepositories {
        boats,
        loads,
        users,
    } = repos;
    let engine = AssignmentService::new(boats, Arc::clone(&loads), policy.clone());
    let boat_service = Arc::new(BoatService::new(engine.clone()));
    let load_service = Arc::new(LoadService::new(loads, policy.clone()));
    let user_service = Arc::new(UserService::new(users, verifier, clock, policy));

    HttpStatePorts {
        login: user_service.clone(),
        users: user_service,
        boats: boat_service.clone(),
        boats_query: boat_service,
        loads: load_service.clone(),
        loads_query: load_service,
        assignments: Arc::new(engine),
    }
}

/// Ports over the in-memory store with the default store call policy.
pub fn memory_ports(
    store: Arc<MemoryRecordStore>,
    verifier: Arc<dyn IdentityVerifier>,
) -> HttpStatePorts {
    memory_ports_with(store, verifier, StoreCallPolicy::default())
}

/// Ports over the in-memory store.
pub fn memory_ports_with(
    store: Arc<MemoryRecordStore>,
    verifier: Arc<dyn IdentityVerifier>,
    policy: StoreCallPolicy,
) -> HttpStatePorts {
    build_ports(
        PortRepositories {
            boats: Arc::clone(&store),
            loads: Arc::clone(&store),
            users: store,
        },
        verifier,
        Arc::new(DefaultClock),
        policy,
    )
}

/// Ports over the PostgreSQL repositories sharing `pool`.
pub fn diesel_ports(
    pool: &DbPool,
    verifier: Arc<dyn IdentityVerifier>,
    policy: StoreCallPolicy,
) -> HttpStatePorts {
    build_ports(
        PortRepositories {
            boats: Arc::new(DieselBoatRepository::new(pool.clone())),
            loads: Arc::new(DieselLoadRepository::new(pool.clone())),
            users: Arc::new(DieselUserRepository::new(pool.clone())),
        },
        verifier,
        Arc::new(DefaultClock),
        policy,
    )
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::FixtureIdentityVerifier;
    use crate::domain::{BoatDraft, IdToken, LoadDraft, PageRequest, Principal};
    use chrono::NaiveDate;
    use mockable::MockClock;

    #[tokio::test]
    async fn memory_ports_share_one_store() {
        let store = Arc::new(MemoryRecordStore::new());
        let ports = memory_ports(Arc::clone(&store), Arc::new(FixtureIdentityVerifier));
        let alice = ports
            .login
            .authenticate(&IdToken::try_from_raw("fixture.alice").expect("token"))
            .await
            .expect("principal");

        let boat = ports
            .boats
            .create(
                &alice,
                BoatDraft::try_from_parts("Orca", "Catamaran", 28, true).expect("draft"),
            )
            .await
            .expect("boat");
        let load = ports
            .loads
            .create(
                &alice,
                LoadDraft::try_from_parts(5, "LEGO Blocks", "2024-02-01").expect("draft"),
            )
            .await
            .expect("load");
        ports
            .assignments
            .assign(&alice, Some(boat.id), Some(load.id))
            .await
            .expect("assign");

        let hydrated = ports
            .boats_query
            .fetch(None, boat.id)
            .await
            .expect("visible");
        assert_eq!(hydrated.loads.len(), 1);
        let page = ports
            .loads_query
            .list(PageRequest::first(5))
            .await
            .expect("page");
        assert_eq!(page.items[0].carrier, Some(boat.id));
    }

    #[tokio::test]
    async fn injected_clock_dates_new_accounts() {
        let mut clock = MockClock::new();
        clock.expect_utc().returning(|| {
            NaiveDate::from_ymd_opt(2024, 2, 1)
                .and_then(|date| date.and_hms_opt(9, 30, 0))
                .expect("timestamp")
                .and_utc()
        });
        let store = Arc::new(MemoryRecordStore::new());
        let ports = build_ports(
            PortRepositories {
                boats: Arc::clone(&store),
                loads: Arc::clone(&store),
                users: store,
            },
            Arc::new(FixtureIdentityVerifier),
            Arc::new(clock),
            StoreCallPolicy::default(),
        );

        let user = ports
            .login
            .login(&IdToken::try_from_raw("fixture.ada.Ada.Lovelace").expect("token"))
            .await
            .expect("login");

        assert_eq!(
            user.account_created,
            NaiveDate::from_ymd_opt(2024, 2, 1).expect("date")
        );
        let me = ports
            .users
            .current(&Principal::new(user.sub.clone()))
            .await
            .expect("current");
        assert_eq!(me, user);
    }
}
