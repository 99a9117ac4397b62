//! PostgreSQL-backed `LoadRepository` implementation using Diesel ORM.
//!
//! Mirrors the boat adapter: compare-and-swap on `version`, existence checks
//! after zero-row writes, keyset pages ordered by id.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{LoadRepository, RecordStoreError};
use crate::domain::{Load, LoadDraft, LoadId, PageRequest, RecordPage, Version};

use super::diesel_helpers::{
    fetch_limit, keyset_page, map_diesel_error, map_pool_error, zero_rows_error,
};
use super::models::{LoadRow, LoadUpdate, NewLoadRow};
use super::pool::DbPool;
use super::schema::loads;

/// Diesel-backed implementation of the `LoadRepository` port.
#[derive(Clone)]
pub struct DieselLoadRepository {
    pool: DbPool,
}

impl DieselLoadRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_key(id: i64) -> String {
    format!("load {id}")
}

async fn load_exists<C>(conn: &mut C, id: i64) -> Result<bool, RecordStoreError>
where
    C: diesel_async::AsyncConnection<Backend = Pg> + Send,
{
    diesel::select(exists(loads::table.find(id)))
        .get_result(conn)
        .await
        .map_err(|error| map_diesel_error(error, &load_key(id)))
}

#[async_trait]
impl LoadRepository for DieselLoadRepository {
    async fn find_by_id(&self, id: LoadId) -> Result<Option<Load>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LoadRow> = loads::table
            .find(id.get())
            .select(LoadRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| map_diesel_error(error, &load_key(id.get())))?;
        row.map(Load::try_from).transpose()
    }

    async fn insert(&self, draft: LoadDraft) -> Result<Load, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewLoadRow {
            volume: i64::from(draft.volume),
            content: draft.content.as_str(),
            creation_date: draft.creation_date,
        };
        let row: LoadRow = diesel::insert_into(loads::table)
            .values(&new_row)
            .returning(LoadRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "load"))?;
        Load::try_from(row)
    }

    async fn update(&self, load: &Load) -> Result<Load, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = load.id.get();
        let updated: Option<LoadRow> = diesel::update(
            loads::table
                .filter(loads::id.eq(id))
                .filter(loads::version.eq(load.version.get())),
        )
        .set(LoadUpdate::from_load(load))
        .returning(LoadRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|error| map_diesel_error(error, &load_key(id)))?;

        match updated {
            Some(row) => Load::try_from(row),
            None => Err(zero_rows_error(
                load_exists(&mut conn, id).await?,
                &load_key(id),
            )),
        }
    }

    async fn delete(&self, id: LoadId, expected: Version) -> Result<(), RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw = id.get();
        let deleted = diesel::delete(
            loads::table
                .filter(loads::id.eq(raw))
                .filter(loads::version.eq(expected.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(|error| map_diesel_error(error, &load_key(raw)))?;

        if deleted > 0 {
            return Ok(());
        }
        Err(zero_rows_error(
            load_exists(&mut conn, raw).await?,
            &load_key(raw),
        ))
    }

    async fn list(&self, page: PageRequest) -> Result<RecordPage<Load>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = loads::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "loads"))?;

        let mut query = loads::table
            .into_boxed()
            .select(LoadRow::as_select())
            .order(loads::id.asc())
            .limit(fetch_limit(page.limit));
        if let Some(after) = page.after {
            query = query.filter(loads::id.gt(after));
        }
        let rows: Vec<LoadRow> = query
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "loads"))?;

        let loads = rows
            .into_iter()
            .map(Load::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keyset_page(loads, page.limit, total))
    }
}
