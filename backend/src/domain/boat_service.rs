//! Boat record services.
//!
//! Boat names are unique by exact match. Uniqueness is read-then-decide here;
//! the PostgreSQL adapter also carries a unique index whose violations map to
//! the same conflict.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    BoatFilter, BoatRepository, BoatsCommand, BoatsQuery, LoadRepository, RecordStoreError,
};
use crate::domain::{
    AssignmentService, Boat, BoatDraft, BoatId, BoatName, BoatPatch, Error, HydratedBoat, Load,
    PageRequest, Principal, RecordPage,
};

fn duplicate_name(name: &BoatName) -> Error {
    Error::conflict(format!("boat name `{name}` is already in use"))
        .with_details(json!({ "code": "duplicate_name" }))
}

fn boat_not_found() -> Error {
    Error::not_found("boat not found")
}

/// Boat service implementing the boat driving ports.
///
/// Single-boat reads go through the assignment engine so load references
/// are verified the same way everywhere.
pub struct BoatService<B, L> {
    engine: AssignmentService<B, L>,
}

impl<B, L> Clone for BoatService<B, L> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<B, L> BoatService<B, L> {
    /// Create the service on top of the assignment engine.
    pub fn new(engine: AssignmentService<B, L>) -> Self {
        Self { engine }
    }
}

impl<B, L> BoatService<B, L>
where
    B: BoatRepository,
    L: LoadRepository,
{
    async fn ensure_name_free(&self, name: &BoatName, except: Option<BoatId>) -> Result<(), Error> {
        let holders = self
            .engine
            .policy
            .read("boats.find_by_name", || self.engine.boats.find_by_name(name))
            .await?;
        if holders.iter().any(|boat| Some(boat.id) != except) {
            return Err(duplicate_name(name));
        }
        Ok(())
    }

    /// Read a boat the principal may modify.
    async fn owned_boat(&self, principal: &Principal, id: BoatId) -> Result<Boat, Error> {
        let sub = principal.sub();
        let boat = self
            .engine
            .read_boat(id)
            .await?
            .filter(|boat| boat.is_visible_to(Some(sub)))
            .ok_or_else(boat_not_found)?;
        if !boat.is_owned_by(sub) {
            return Err(Error::forbidden("only the owner may modify this boat"));
        }
        Ok(boat)
    }

    async fn store_update(&self, boat: &Boat) -> Result<Boat, Error> {
        self.engine.write_boat(boat).await.map_err(|error| match error {
            RecordStoreError::Missing { .. } => boat_not_found(),
            RecordStoreError::Duplicate { .. } => duplicate_name(&boat.name),
            other => other.into(),
        })
    }
}

#[async_trait]
impl<B, L> BoatsCommand for BoatService<B, L>
where
    B: BoatRepository,
    L: LoadRepository,
{
    async fn create(&self, principal: &Principal, draft: BoatDraft) -> Result<Boat, Error> {
        self.ensure_name_free(&draft.name, None).await?;
        let sub = principal.sub();
        let boat = self
            .engine
            .policy
            .write("boats.insert", || self.engine.boats.insert(sub, draft.clone()))
            .await
            .map_err(|error| match error {
                RecordStoreError::Duplicate { .. } => duplicate_name(&draft.name),
                other => other.into(),
            })?;
        info!(sub = %sub, boat_id = %boat.id, "boat created");
        Ok(boat)
    }

    async fn replace(
        &self,
        principal: &Principal,
        id: BoatId,
        draft: BoatDraft,
    ) -> Result<Boat, Error> {
        let mut boat = self.owned_boat(principal, id).await?;
        if draft.name != boat.name {
            self.ensure_name_free(&draft.name, Some(id)).await?;
        }
        boat.replace_details(draft);
        self.store_update(&boat).await
    }

    async fn patch(
        &self,
        principal: &Principal,
        id: BoatId,
        patch: BoatPatch,
    ) -> Result<Boat, Error> {
        let mut boat = self.owned_boat(principal, id).await?;
        if let Some(name) = patch.name.as_ref().filter(|name| **name != boat.name) {
            self.ensure_name_free(name, Some(id)).await?;
        }
        boat.apply_patch(patch);
        self.store_update(&boat).await
    }

    async fn delete(&self, principal: &Principal, id: BoatId) -> Result<(), Error> {
        let boat = self.owned_boat(principal, id).await?;
        if !boat.loads.is_empty() {
            return Err(Error::conflict("boat still carries loads; unassign them first")
                .with_details(json!({ "code": "boat_has_loads" })));
        }
        self.engine
            .policy
            .write("boats.delete", || self.engine.boats.delete(id, boat.version))
            .await
            .map_err(|error| match error {
                RecordStoreError::Missing { .. } => boat_not_found(),
                other => Error::from(other),
            })?;
        info!(sub = %principal.sub(), boat_id = %id, "boat deleted");
        Ok(())
    }
}

#[async_trait]
impl<B, L> BoatsQuery for BoatService<B, L>
where
    B: BoatRepository,
    L: LoadRepository,
{
    async fn list(
        &self,
        viewer: Option<&Principal>,
        page: PageRequest,
    ) -> Result<RecordPage<Boat>, Error> {
        let filter = viewer.map_or(BoatFilter::Public, |principal| {
            BoatFilter::OwnedBy(principal.sub().clone())
        });
        let boats = self
            .engine
            .policy
            .read("boats.list", || self.engine.boats.list(&filter, page))
            .await?;
        Ok(boats)
    }

    async fn fetch(&self, viewer: Option<&Principal>, id: BoatId) -> Result<HydratedBoat, Error> {
        self.engine
            .fetch_boat_with_loads(viewer.map(Principal::sub), id)
            .await
    }

    async fn loads_on_boat(
        &self,
        viewer: Option<&Principal>,
        id: BoatId,
    ) -> Result<Vec<Load>, Error> {
        Ok(self.fetch(viewer, id).await?.loads)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::sync::Arc;
    use std::time::Duration;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::{MockBoatRepository, MockLoadRepository};
    use crate::domain::{ErrorCode, LoadId, NoJitter, StoreCallPolicy, Subject, Version};

    fn principal(sub: &str) -> Principal {
        Principal::new(Subject::new(sub).expect("sub"))
    }

    fn stored(id: i64, name: &str, public: bool) -> Boat {
        let draft = BoatDraft::try_from_parts(name, "Sloop", 12, public).expect("draft");
        Boat::from_draft(
            BoatId::new(id).expect("id"),
            Subject::new("owner").expect("sub"),
            draft,
        )
    }

    fn service(boats: MockBoatRepository) -> BoatService<MockBoatRepository, MockLoadRepository> {
        let policy = StoreCallPolicy::new(Duration::from_millis(200), 1, Duration::ZERO)
            .with_jitter(Arc::new(NoJitter));
        BoatService::new(AssignmentService::new(
            Arc::new(boats),
            Arc::new(MockLoadRepository::new()),
            policy,
        ))
    }

    fn details_code(error: &Error) -> Option<&str> {
        error.details()?.get("code")?.as_str()
    }

    #[fixture]
    fn orca_draft() -> BoatDraft {
        BoatDraft::try_from_parts("Orca", "Catamaran", 28, true).expect("draft")
    }

    #[rstest]
    #[tokio::test]
    async fn create_stores_boat_for_principal(orca_draft: BoatDraft) {
        let mut boats = MockBoatRepository::new();
        boats.expect_find_by_name().returning(|_| Ok(Vec::new()));
        boats
            .expect_insert()
            .withf(|owner, draft| owner.as_ref() == "owner" && draft.name.as_ref() == "Orca")
            .times(1)
            .returning(|owner, draft| {
                Ok(Boat::from_draft(BoatId::new(1).expect("id"), owner.clone(), draft))
            });

        let boat = service(boats)
            .create(&principal("owner"), orca_draft)
            .await
            .expect("created");
        assert_eq!(boat.id.get(), 1);
        assert!(boat.loads.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn create_rejects_taken_names(orca_draft: BoatDraft) {
        let mut boats = MockBoatRepository::new();
        boats
            .expect_find_by_name()
            .returning(|_| Ok(vec![stored(3, "Orca", false)]));

        let err = service(boats)
            .create(&principal("owner"), orca_draft)
            .await
            .expect_err("taken");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(details_code(&err), Some("duplicate_name"));
    }

    #[rstest]
    #[tokio::test]
    async fn unique_index_violations_map_to_duplicate_name(orca_draft: BoatDraft) {
        let mut boats = MockBoatRepository::new();
        boats.expect_find_by_name().returning(|_| Ok(Vec::new()));
        boats
            .expect_insert()
            .returning(|_, _| Err(RecordStoreError::duplicate("boat name")));

        let err = service(boats)
            .create(&principal("owner"), orca_draft)
            .await
            .expect_err("raced");
        assert_eq!(details_code(&err), Some("duplicate_name"));
    }

    #[rstest]
    #[tokio::test]
    async fn replace_keeps_own_name_and_loads(orca_draft: BoatDraft) {
        let mut current = stored(1, "Orca", true);
        current.loads = vec![LoadId::new(9).expect("id")];
        let mut boats = MockBoatRepository::new();
        boats
            .expect_find_by_id()
            .returning(move |_| Ok(Some(current.clone())));
        boats
            .expect_update()
            .withf(|boat| boat.boat_type == "Catamaran" && boat.loads.len() == 1)
            .returning(|boat| {
                let mut next = boat.clone();
                next.version = boat.version.next();
                Ok(next)
            });

        let boat = service(boats)
            .replace(&principal("owner"), BoatId::new(1).expect("id"), orca_draft)
            .await
            .expect("replaced");
        assert_eq!(boat.version, Version::INITIAL.next());
    }

    #[rstest]
    #[tokio::test]
    async fn patch_rename_checks_other_boats() {
        let mut boats = MockBoatRepository::new();
        boats
            .expect_find_by_id()
            .returning(|_| Ok(Some(stored(1, "Orca", true))));
        boats
            .expect_find_by_name()
            .returning(|_| Ok(vec![stored(2, "Narwhal", true)]));
        let patch = BoatPatch::try_from_parts(Some("Narwhal".into()), None, None, None)
            .expect("patch");

        let err = service(boats)
            .patch(&principal("owner"), BoatId::new(1).expect("id"), patch)
            .await
            .expect_err("taken");
        assert_eq!(details_code(&err), Some("duplicate_name"));
    }

    #[rstest]
    #[case(true, ErrorCode::Forbidden)]
    #[case(false, ErrorCode::NotFound)]
    #[tokio::test]
    async fn non_owners_cannot_modify(#[case] public: bool, #[case] expected: ErrorCode) {
        let mut boats = MockBoatRepository::new();
        boats
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored(1, "Orca", public))));

        let err = service(boats)
            .delete(&principal("intruder"), BoatId::new(1).expect("id"))
            .await
            .expect_err("refused");
        assert_eq!(err.code(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_refuses_boats_with_loads() {
        let mut boat = stored(1, "Orca", false);
        boat.loads = vec![LoadId::new(9).expect("id")];
        let mut boats = MockBoatRepository::new();
        boats
            .expect_find_by_id()
            .returning(move |_| Ok(Some(boat.clone())));

        let err = service(boats)
            .delete(&principal("owner"), BoatId::new(1).expect("id"))
            .await
            .expect_err("guarded");
        assert_eq!(details_code(&err), Some("boat_has_loads"));
    }

    #[rstest]
    #[tokio::test]
    async fn delete_uses_the_read_version() {
        let mut boat = stored(1, "Orca", false);
        boat.version = Version::from_stored(4);
        let mut boats = MockBoatRepository::new();
        boats
            .expect_find_by_id()
            .returning(move |_| Ok(Some(boat.clone())));
        boats
            .expect_delete()
            .withf(|_, expected| expected.get() == 4)
            .times(1)
            .returning(|_, _| Ok(()));

        service(boats)
            .delete(&principal("owner"), BoatId::new(1).expect("id"))
            .await
            .expect("deleted");
    }

    #[rstest]
    #[case(Some("owner"), BoatFilter::OwnedBy(Subject::new("owner").expect("sub")))]
    #[case(None, BoatFilter::Public)]
    #[tokio::test]
    async fn listing_filters_by_viewer(#[case] viewer: Option<&str>, #[case] expected: BoatFilter) {
        let mut boats = MockBoatRepository::new();
        boats
            .expect_list()
            .withf(move |filter, _| *filter == expected)
            .times(1)
            .returning(|_, _| Ok(RecordPage::empty()));

        let viewer = viewer.map(principal);
        let page = service(boats)
            .list(viewer.as_ref(), PageRequest::first(5))
            .await
            .expect("listed");
        assert!(page.items.is_empty());
    }
}
