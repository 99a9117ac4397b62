//! HTTP inbound adapter exposing REST endpoints.

pub mod accept;
pub mod assignments;
pub mod auth;
pub mod boats;
pub mod error;
pub mod extract;
pub mod health;
pub mod links;
pub mod loads;
pub mod paging;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;
