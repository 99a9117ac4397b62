//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AssignmentCommand, BoatsCommand, BoatsQuery, LoadsCommand, LoadsQuery, LoginService,
    UsersQuery,
};

/// Default number of records on a listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 5;
/// Largest page a client may request through `limit`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size bounds applied to every listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: u32,
    pub max: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: DEFAULT_PAGE_SIZE,
            max: MAX_PAGE_SIZE,
        }
    }
}

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UsersQuery>,
    pub boats: Arc<dyn BoatsCommand>,
    pub boats_query: Arc<dyn BoatsQuery>,
    pub loads: Arc<dyn LoadsCommand>,
    pub loads_query: Arc<dyn LoadsQuery>,
    pub assignments: Arc<dyn AssignmentCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UsersQuery>,
    pub boats: Arc<dyn BoatsCommand>,
    pub boats_query: Arc<dyn BoatsQuery>,
    pub loads: Arc<dyn LoadsCommand>,
    pub loads_query: Arc<dyn LoadsQuery>,
    pub assignments: Arc<dyn AssignmentCommand>,
    pub page_limits: PageLimits,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports, PageLimits::default())
    }
}

impl HttpState {
    /// Construct state from a ports bundle and listing bounds.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use harbour::domain::ports::FixtureIdentityVerifier;
    /// use harbour::inbound::http::state::{HttpState, PageLimits};
    /// use harbour::outbound::memory::MemoryRecordStore;
    /// use harbour::server::memory_ports;
    ///
    /// let store = Arc::new(MemoryRecordStore::default());
    /// let ports = memory_ports(store, Arc::new(FixtureIdentityVerifier));
    /// let state = HttpState::new(ports, PageLimits::default());
    /// assert_eq!(state.page_limits.default, 5);
    /// ```
    pub fn new(ports: HttpStatePorts, page_limits: PageLimits) -> Self {
        let HttpStatePorts {
            login,
            users,
            boats,
            boats_query,
            loads,
            loads_query,
            assignments,
        } = ports;
        Self {
            login,
            users,
            boats,
            boats_query,
            loads,
            loads_query,
            assignments,
            page_limits,
        }
    }
}
