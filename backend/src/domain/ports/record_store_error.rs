//! Errors shared by every record repository adapter.

use serde_json::json;

use crate::domain::Error;

use super::define_port_error;

define_port_error! {
    /// Failures raised by record repository adapters.
    pub enum RecordStoreError {
        /// The store could not be reached.
        Connection { message: String } => "record store connection failed: {message}",
        /// The store rejected or failed to run an operation.
        Query { message: String } => "record store query failed: {message}",
        /// The call did not complete within the store call policy's budget.
        Timeout { operation: String } => "record store call `{operation}` timed out",
        /// The addressed record does not exist.
        Missing { key: String } => "record {key} does not exist",
        /// The record changed since it was read.
        VersionConflict { key: String } => "record {key} was modified concurrently",
        /// A uniqueness constraint rejected the write.
        Duplicate { key: String } => "record {key} already exists",
    }
}

impl RecordStoreError {
    /// Whether re-running a read can reasonably succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout { .. })
    }
}

impl From<RecordStoreError> for Error {
    fn from(error: RecordStoreError) -> Self {
        match error {
            RecordStoreError::Connection { .. } | RecordStoreError::Timeout { .. } => {
                Error::service_unavailable("record store unavailable, retry later")
            }
            RecordStoreError::Query { message } => Error::internal(message),
            RecordStoreError::Missing { key } => Error::not_found(format!("{key} not found")),
            RecordStoreError::VersionConflict { .. } => {
                Error::conflict("record was modified concurrently, retry the request")
                    .with_details(json!({ "code": "concurrent_modification" }))
            }
            RecordStoreError::Duplicate { key } => {
                Error::conflict(format!("{key} already exists"))
            }
        }
    }
}
