//! PostgreSQL-backed `BoatRepository` implementation using Diesel ORM.
//!
//! Updates and deletes are compare-and-swap on the `version` column. A
//! statement that matches no rows is followed by an existence check so
//! callers can tell a stale version from a deleted boat.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BoatFilter, BoatRepository, RecordStoreError};
use crate::domain::{Boat, BoatDraft, BoatId, BoatName, PageRequest, RecordPage, Subject, Version};

use super::diesel_helpers::{
    fetch_limit, keyset_page, map_diesel_error, map_pool_error, zero_rows_error,
};
use super::models::{BoatRow, BoatUpdate, NewBoatRow};
use super::pool::DbPool;
use super::schema::boats;

/// Diesel-backed implementation of the `BoatRepository` port.
#[derive(Clone)]
pub struct DieselBoatRepository {
    pool: DbPool,
}

impl DieselBoatRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn boat_key(id: i64) -> String {
    format!("boat {id}")
}

fn filtered(filter: &BoatFilter) -> boats::BoxedQuery<'_, Pg> {
    let query = boats::table.into_boxed();
    match filter {
        BoatFilter::OwnedBy(sub) => query.filter(boats::owner_sub.eq(sub.as_ref())),
        BoatFilter::Public => query.filter(boats::is_public.eq(true)),
        BoatFilter::All => query,
    }
}

fn rows_to_boats(rows: Vec<BoatRow>) -> Result<Vec<Boat>, RecordStoreError> {
    rows.into_iter().map(Boat::try_from).collect()
}

async fn boat_exists<C>(conn: &mut C, id: i64) -> Result<bool, RecordStoreError>
where
    C: diesel_async::AsyncConnection<Backend = Pg> + Send,
{
    diesel::select(exists(boats::table.find(id)))
        .get_result(conn)
        .await
        .map_err(|error| map_diesel_error(error, &boat_key(id)))
}

#[async_trait]
impl BoatRepository for DieselBoatRepository {
    async fn find_by_id(&self, id: BoatId) -> Result<Option<Boat>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<BoatRow> = boats::table
            .find(id.get())
            .select(BoatRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| map_diesel_error(error, &boat_key(id.get())))?;
        row.map(Boat::try_from).transpose()
    }

    async fn find_by_name(&self, name: &BoatName) -> Result<Vec<Boat>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<BoatRow> = boats::table
            .filter(boats::name.eq(name.as_ref()))
            .select(BoatRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "boat name"))?;
        rows_to_boats(rows)
    }

    async fn insert(&self, owner: &Subject, draft: BoatDraft) -> Result<Boat, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewBoatRow {
            owner_sub: owner.as_ref(),
            name: draft.name.as_ref(),
            boat_type: draft.boat_type.as_str(),
            length: i64::from(draft.length),
            is_public: draft.public,
        };
        let row: BoatRow = diesel::insert_into(boats::table)
            .values(&new_row)
            .returning(BoatRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, &format!("boat name `{}`", draft.name)))?;
        Boat::try_from(row)
    }

    async fn update(&self, boat: &Boat) -> Result<Boat, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = boat.id.get();
        let updated: Option<BoatRow> = diesel::update(
            boats::table
                .filter(boats::id.eq(id))
                .filter(boats::version.eq(boat.version.get())),
        )
        .set(BoatUpdate::from_boat(boat))
        .returning(BoatRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|error| map_diesel_error(error, &boat_key(id)))?;

        match updated {
            Some(row) => Boat::try_from(row),
            None => Err(zero_rows_error(
                boat_exists(&mut conn, id).await?,
                &boat_key(id),
            )),
        }
    }

    async fn delete(&self, id: BoatId, expected: Version) -> Result<(), RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw = id.get();
        let deleted = diesel::delete(
            boats::table
                .filter(boats::id.eq(raw))
                .filter(boats::version.eq(expected.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(|error| map_diesel_error(error, &boat_key(raw)))?;

        if deleted > 0 {
            return Ok(());
        }
        Err(zero_rows_error(
            boat_exists(&mut conn, raw).await?,
            &boat_key(raw),
        ))
    }

    async fn list(
        &self,
        filter: &BoatFilter,
        page: PageRequest,
    ) -> Result<RecordPage<Boat>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "boats"))?;

        let mut query = filtered(filter)
            .select(BoatRow::as_select())
            .order(boats::id.asc())
            .limit(fetch_limit(page.limit));
        if let Some(after) = page.after {
            query = query.filter(boats::id.gt(after));
        }
        let rows: Vec<BoatRow> = query
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "boats"))?;

        Ok(keyset_page(rows_to_boats(rows)?, page.limit, total))
    }
}
