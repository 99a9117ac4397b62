//! Shared helpers for the Diesel record repositories.
//!
//! This module provides:
//! - Error mapping from pool and Diesel errors to [`RecordStoreError`]
//! - Keyset page assembly shared by every listing query
//! - Disambiguation of compare-and-swap writes that touched zero rows

use tracing::debug;

use crate::domain::RecordPage;
use crate::domain::ports::RecordStoreError;

use super::pool::PoolError;

/// Map pool errors to record store connection errors.
pub fn map_pool_error(error: PoolError) -> RecordStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            RecordStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to record store errors.
///
/// `key` names the record addressed by the failing statement so unique
/// violations and missing rows carry it.
pub fn map_diesel_error(error: diesel::result::Error, key: &str) -> RecordStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), key, "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            key,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => RecordStoreError::missing(key),
        DieselError::QueryBuilderError(_) => RecordStoreError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            RecordStoreError::duplicate(key)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RecordStoreError::connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => RecordStoreError::query("database error"),
        _ => RecordStoreError::query("database error"),
    }
}

/// Outcome of a compare-and-swap statement that matched no rows.
///
/// `still_exists` is the result of a follow-up existence check on the key.
pub fn zero_rows_error(still_exists: bool, key: &str) -> RecordStoreError {
    if still_exists {
        RecordStoreError::version_conflict(key)
    } else {
        RecordStoreError::missing(key)
    }
}

/// Build a page from rows fetched with `LIMIT limit + 1`.
pub fn keyset_page<T>(mut rows: Vec<T>, limit: u32, total: i64) -> RecordPage<T> {
    let limit = usize::try_from(limit.max(1)).unwrap_or(usize::MAX);
    let has_more = rows.len() > limit;
    rows.truncate(limit);
    RecordPage {
        items: rows,
        total: u64::try_from(total).unwrap_or_default(),
        has_more,
    }
}

/// Rows to request for a page of `limit` records.
pub fn fetch_limit(limit: u32) -> i64 {
    i64::from(limit.max(1)) + 1
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, "VersionConflict")]
    #[case(false, "Missing")]
    fn zero_rows_distinguish_stale_from_missing(#[case] exists: bool, #[case] expected: &str) {
        let error = zero_rows_error(exists, "boat 1");
        let matched = match expected {
            "VersionConflict" => matches!(error, RecordStoreError::VersionConflict { .. }),
            _ => matches!(error, RecordStoreError::Missing { .. }),
        };
        assert!(matched, "unexpected error {error:?}");
    }

    #[rstest]
    fn keyset_pages_trim_the_lookahead_row() {
        let page = keyset_page(vec![1, 2, 3], 2, 7);
        assert_eq!(page.items, [1, 2]);
        assert!(page.has_more);
        assert_eq!(page.total, 7);
        assert_eq!(fetch_limit(2), 3);
    }

    #[rstest]
    fn not_found_maps_to_missing() {
        let error = map_diesel_error(diesel::result::Error::NotFound, "load 9");
        assert_eq!(error, RecordStoreError::missing("load 9"));
    }

    #[rstest]
    fn pool_errors_are_connection_failures() {
        let error = map_pool_error(PoolError::checkout("timed out"));
        assert!(error.is_transient());
    }
}
