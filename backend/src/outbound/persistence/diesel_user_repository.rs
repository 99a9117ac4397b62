//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RecordStoreError, UserRepository};
use crate::domain::{NewUser, PageRequest, RecordPage, Subject, User};

use super::diesel_helpers::{fetch_limit, keyset_page, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
///
/// The unique index on `sub` turns a concurrent first login into
/// [`RecordStoreError::Duplicate`], which the login service resolves by
/// re-reading.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_sub(&self, sub: &Subject) -> Result<Option<User>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::sub.eq(sub.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| map_diesel_error(error, &format!("user {sub}")))?;
        row.map(User::try_from).transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewUserRow {
            sub: user.sub.as_ref(),
            first_name: user.first_name.as_str(),
            last_name: user.last_name.as_str(),
            account_created: user.account_created,
        };
        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, &format!("user {}", user.sub)))?;
        User::try_from(row)
    }

    async fn list(&self, page: PageRequest) -> Result<RecordPage<User>, RecordStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "users"))?;

        let mut query = users::table
            .into_boxed()
            .select(UserRow::as_select())
            .order(users::id.asc())
            .limit(fetch_limit(page.limit));
        if let Some(after) = page.after {
            query = query.filter(users::id.gt(after));
        }
        let rows: Vec<UserRow> = query
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "users"))?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keyset_page(users, page.limit, total))
    }
}
