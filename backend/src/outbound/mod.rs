//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed record repositories using Diesel ORM
//! - **memory**: process-local record store for development and tests
//! - **identity**: Google token-info verifier for login ID tokens
//!
//! Adapters translate between domain records and infrastructure
//! representations. They contain no assignment rules.

pub mod identity;
pub mod memory;
pub mod persistence;
