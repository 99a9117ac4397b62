//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the record repository
//! ports backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   records. Assignment rules live in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Optimistic concurrency**: updates and deletes compare the stored
//!   `version`; a stale write surfaces as
//!   [`RecordStoreError::VersionConflict`](crate::domain::ports::RecordStoreError).
//! - **Unique boat names**: the `boats_name_key` index turns a lost
//!   duplicate-name race into `RecordStoreError::Duplicate`.
//!
//! # Example
//!
//! ```ignore
//! use harbour::outbound::persistence::{DbPool, DieselBoatRepository, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/harbour");
//! let pool = DbPool::new(config).await?;
//! let boats = DieselBoatRepository::new(pool);
//! ```

mod diesel_boat_repository;
pub(crate) mod diesel_helpers;
mod diesel_load_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_boat_repository::DieselBoatRepository;
pub use diesel_load_repository::DieselLoadRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
