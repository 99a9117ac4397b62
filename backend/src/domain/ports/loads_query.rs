//! Driving port for load reads.

use async_trait::async_trait;

use crate::domain::{Error, Load, LoadId, PageRequest, RecordPage};

/// Use-case port for listing and fetching loads.
#[async_trait]
pub trait LoadsQuery: Send + Sync {
    /// Page through every load.
    async fn list(&self, page: PageRequest) -> Result<RecordPage<Load>, Error>;

    /// Fetch one load.
    async fn get(&self, id: LoadId) -> Result<Load, Error>;
}
