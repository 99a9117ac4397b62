//! In-process record store.
//!
//! Backs the service when no database is configured and drives the HTTP
//! integration tests. Each table is a `BTreeMap` keyed by record id so
//! keyset pages fall out of range scans. Writes honour the same
//! compare-and-swap contract as the PostgreSQL adapter; like a plain
//! key-value store it enforces no uniqueness on boat names.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    BoatFilter, BoatRepository, LoadRepository, RecordStoreError, UserRepository,
};
use crate::domain::{
    Boat, BoatDraft, BoatId, BoatName, Load, LoadDraft, LoadId, NewUser, PageRequest, RecordPage,
    Subject, User, UserId, Version,
};

#[derive(Debug, Default)]
struct Tables {
    boats: BTreeMap<BoatId, Boat>,
    loads: BTreeMap<LoadId, Load>,
    users: BTreeMap<UserId, User>,
    last_boat: i64,
    last_load: i64,
    last_user: i64,
}

fn next_key(last: &mut i64) -> Result<i64, RecordStoreError> {
    *last = last
        .checked_add(1)
        .ok_or_else(|| RecordStoreError::query("record key space exhausted"))?;
    Ok(*last)
}

/// Collect one keyset page from `rows`, which must already be positioned
/// after the cursor.
fn page_of<'a, K: 'a, T: Clone + 'a>(
    rows: impl Iterator<Item = (&'a K, &'a T)>,
    limit: u32,
    keep: impl Fn(&T) -> bool,
) -> RecordPage<T> {
    let limit = usize::try_from(limit.max(1)).unwrap_or(usize::MAX);
    let matching: Vec<&T> = rows.map(|(_, row)| row).filter(|row| keep(row)).collect();
    RecordPage {
        total: 0,
        has_more: matching.len() > limit,
        items: matching.into_iter().take(limit).cloned().collect(),
    }
}

fn lower_bound<K>(after: Option<i64>, key: impl Fn(i64) -> Option<K>) -> Bound<K> {
    after
        .and_then(key)
        .map_or(Bound::Unbounded, Bound::Excluded)
}

/// Record store held in process memory.
///
/// # Examples
/// ```
/// use harbour::domain::ports::LoadRepository;
/// use harbour::domain::LoadDraft;
/// use harbour::outbound::memory::MemoryRecordStore;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let store = MemoryRecordStore::new();
/// let draft = LoadDraft::try_from_parts(5, "LEGO blocks", "2024-03-01").expect("draft");
/// let load = store.insert(draft).await.expect("insert");
/// assert_eq!(load.id.get(), 1);
/// assert!(load.carrier.is_none());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RecordStoreError> {
        self.tables
            .lock()
            .map_err(|_| RecordStoreError::query("memory store lock poisoned"))
    }
}

#[async_trait]
impl BoatRepository for MemoryRecordStore {
    async fn find_by_id(&self, id: BoatId) -> Result<Option<Boat>, RecordStoreError> {
        Ok(self.tables()?.boats.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &BoatName) -> Result<Vec<Boat>, RecordStoreError> {
        let tables = self.tables()?;
        Ok(tables
            .boats
            .values()
            .filter(|boat| &boat.name == name)
            .cloned()
            .collect())
    }

    async fn insert(&self, owner: &Subject, draft: BoatDraft) -> Result<Boat, RecordStoreError> {
        let mut tables = self.tables()?;
        let raw = next_key(&mut tables.last_boat)?;
        let id = BoatId::new(raw).ok_or_else(|| RecordStoreError::query("invalid boat key"))?;
        let boat = Boat::from_draft(id, owner.clone(), draft);
        tables.boats.insert(id, boat.clone());
        Ok(boat)
    }

    async fn update(&self, boat: &Boat) -> Result<Boat, RecordStoreError> {
        let mut tables = self.tables()?;
        let stored = tables
            .boats
            .get_mut(&boat.id)
            .ok_or_else(|| RecordStoreError::missing(format!("boat {}", boat.id)))?;
        if stored.version != boat.version {
            return Err(RecordStoreError::version_conflict(format!("boat {}", boat.id)));
        }
        *stored = Boat {
            version: boat.version.next(),
            ..boat.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: BoatId, expected: Version) -> Result<(), RecordStoreError> {
        let mut tables = self.tables()?;
        match tables.boats.get(&id) {
            None => Err(RecordStoreError::missing(format!("boat {id}"))),
            Some(stored) if stored.version != expected => {
                Err(RecordStoreError::version_conflict(format!("boat {id}")))
            }
            Some(_) => {
                tables.boats.remove(&id);
                Ok(())
            }
        }
    }

    async fn list(
        &self,
        filter: &BoatFilter,
        page: PageRequest,
    ) -> Result<RecordPage<Boat>, RecordStoreError> {
        let tables = self.tables()?;
        let start = lower_bound(page.after, BoatId::new);
        let mut result = page_of(
            tables.boats.range((start, Bound::Unbounded)),
            page.limit,
            |boat| filter.matches(boat),
        );
        result.total = tables.boats.values().filter(|b| filter.matches(b)).count() as u64;
        Ok(result)
    }
}

#[async_trait]
impl LoadRepository for MemoryRecordStore {
    async fn find_by_id(&self, id: LoadId) -> Result<Option<Load>, RecordStoreError> {
        Ok(self.tables()?.loads.get(&id).cloned())
    }

    async fn insert(&self, draft: LoadDraft) -> Result<Load, RecordStoreError> {
        let mut tables = self.tables()?;
        let raw = next_key(&mut tables.last_load)?;
        let id = LoadId::new(raw).ok_or_else(|| RecordStoreError::query("invalid load key"))?;
        let load = Load::from_draft(id, draft);
        tables.loads.insert(id, load.clone());
        Ok(load)
    }

    async fn update(&self, load: &Load) -> Result<Load, RecordStoreError> {
        let mut tables = self.tables()?;
        let stored = tables
            .loads
            .get_mut(&load.id)
            .ok_or_else(|| RecordStoreError::missing(format!("load {}", load.id)))?;
        if stored.version != load.version {
            return Err(RecordStoreError::version_conflict(format!("load {}", load.id)));
        }
        *stored = Load {
            version: load.version.next(),
            ..load.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: LoadId, expected: Version) -> Result<(), RecordStoreError> {
        let mut tables = self.tables()?;
        match tables.loads.get(&id) {
            None => Err(RecordStoreError::missing(format!("load {id}"))),
            Some(stored) if stored.version != expected => {
                Err(RecordStoreError::version_conflict(format!("load {id}")))
            }
            Some(_) => {
                tables.loads.remove(&id);
                Ok(())
            }
        }
    }

    async fn list(&self, page: PageRequest) -> Result<RecordPage<Load>, RecordStoreError> {
        let tables = self.tables()?;
        let start = lower_bound(page.after, LoadId::new);
        let mut result = page_of(
            tables.loads.range((start, Bound::Unbounded)),
            page.limit,
            |_| true,
        );
        result.total = tables.loads.len() as u64;
        Ok(result)
    }
}

#[async_trait]
impl UserRepository for MemoryRecordStore {
    async fn find_by_sub(&self, sub: &Subject) -> Result<Option<User>, RecordStoreError> {
        let tables = self.tables()?;
        Ok(tables.users.values().find(|user| &user.sub == sub).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, RecordStoreError> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|existing| existing.sub == user.sub) {
            return Err(RecordStoreError::duplicate(format!("user {}", user.sub)));
        }
        let raw = next_key(&mut tables.last_user)?;
        let id = UserId::new(raw).ok_or_else(|| RecordStoreError::query("invalid user key"))?;
        let user = User::from_new(id, user);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn list(&self, page: PageRequest) -> Result<RecordPage<User>, RecordStoreError> {
        let tables = self.tables()?;
        let start = lower_bound(page.after, UserId::new);
        let mut result = page_of(
            tables.users.range((start, Bound::Unbounded)),
            page.limit,
            |_| true,
        );
        result.total = tables.users.len() as u64;
        Ok(result)
    }
}
