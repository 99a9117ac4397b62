//! Load record services. The carrier is owned by the assignment engine and is
//! never written here.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{LoadRepository, LoadsCommand, LoadsQuery, RecordStoreError};
use crate::domain::{
    Error, Load, LoadDraft, LoadId, LoadPatch, PageRequest, Principal, RecordPage,
    StoreCallPolicy,
};

fn load_not_found() -> Error {
    Error::not_found("load not found")
}

fn missing_as_not_found(error: RecordStoreError) -> Error {
    match error {
        RecordStoreError::Missing { .. } => load_not_found(),
        other => other.into(),
    }
}

/// Load service implementing the load driving ports.
pub struct LoadService<L> {
    loads: Arc<L>,
    policy: StoreCallPolicy,
}

impl<L> Clone for LoadService<L> {
    fn clone(&self) -> Self {
        Self {
            loads: Arc::clone(&self.loads),
            policy: self.policy.clone(),
        }
    }
}

impl<L> LoadService<L> {
    /// Create the service.
    pub fn new(loads: Arc<L>, policy: StoreCallPolicy) -> Self {
        Self { loads, policy }
    }
}

impl<L: LoadRepository> LoadService<L> {
    async fn read(&self, id: LoadId) -> Result<Load, Error> {
        self.policy
            .read("loads.find_by_id", || self.loads.find_by_id(id))
            .await?
            .ok_or_else(load_not_found)
    }

    async fn store_update(&self, load: &Load) -> Result<Load, Error> {
        self.policy
            .write("loads.update", || self.loads.update(load))
            .await
            .map_err(missing_as_not_found)
    }
}

#[async_trait]
impl<L: LoadRepository> LoadsCommand for LoadService<L> {
    async fn create(&self, principal: &Principal, draft: LoadDraft) -> Result<Load, Error> {
        let load = self
            .policy
            .write("loads.insert", || self.loads.insert(draft.clone()))
            .await?;
        info!(sub = %principal.sub(), load_id = %load.id, "load created");
        Ok(load)
    }

    async fn replace(
        &self,
        _principal: &Principal,
        id: LoadId,
        draft: LoadDraft,
    ) -> Result<Load, Error> {
        let mut load = self.read(id).await?;
        load.replace_details(draft);
        self.store_update(&load).await
    }

    async fn patch(
        &self,
        _principal: &Principal,
        id: LoadId,
        patch: LoadPatch,
    ) -> Result<Load, Error> {
        let mut load = self.read(id).await?;
        load.apply_patch(patch);
        self.store_update(&load).await
    }

    async fn delete(&self, principal: &Principal, id: LoadId) -> Result<(), Error> {
        let load = self.read(id).await?;
        if let Some(carrier) = load.carrier {
            return Err(Error::conflict("load is on a boat; unassign it first")
                .with_details(json!({ "code": "load_on_boat", "carrier": carrier.to_string() })));
        }
        self.policy
            .write("loads.delete", || self.loads.delete(id, load.version))
            .await
            .map_err(missing_as_not_found)?;
        info!(sub = %principal.sub(), load_id = %id, "load deleted");
        Ok(())
    }
}

#[async_trait]
impl<L: LoadRepository> LoadsQuery for LoadService<L> {
    async fn list(&self, page: PageRequest) -> Result<RecordPage<Load>, Error> {
        Ok(self
            .policy
            .read("loads.list", || self.loads.list(page))
            .await?)
    }

    async fn get(&self, id: LoadId) -> Result<Load, Error> {
        self.read(id).await
    }
}
