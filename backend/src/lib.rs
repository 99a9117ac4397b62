//! Harbour: boats, loads and the users who own them, over a REST API.
//!
//! The crate follows a hexagonal layout. [`domain`] holds the records, the
//! assignment engine and the ports; [`inbound`] adapts HTTP requests onto the
//! driving ports; [`outbound`] implements the driven ports over memory,
//! PostgreSQL and the identity provider; [`server`] wires them together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
