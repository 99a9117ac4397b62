//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`IdentityVerifier`]) are implemented by
//! outbound adapters. Driving ports (`*Command`, `*Query`, [`LoginService`])
//! are implemented by domain services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod assignment_command;
mod boat_repository;
mod boats_command;
mod boats_query;
mod identity_verifier;
mod load_repository;
mod loads_command;
mod loads_query;
mod login_service;
mod record_store_error;
mod user_repository;
mod users_query;

pub use assignment_command::AssignmentCommand;
#[cfg(test)]
pub use boat_repository::MockBoatRepository;
pub use boat_repository::{BoatFilter, BoatRepository};
pub use boats_command::BoatsCommand;
pub use boats_query::BoatsQuery;
#[cfg(test)]
pub use identity_verifier::MockIdentityVerifier;
pub use identity_verifier::{
    FIXTURE_TOKEN_PREFIX, FixtureIdentityVerifier, IdentityError, IdentityVerifier,
};
#[cfg(test)]
pub use load_repository::MockLoadRepository;
pub use load_repository::LoadRepository;
pub use loads_command::LoadsCommand;
pub use loads_query::LoadsQuery;
pub use login_service::LoginService;
pub use record_store_error::RecordStoreError;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
pub use users_query::UsersQuery;
