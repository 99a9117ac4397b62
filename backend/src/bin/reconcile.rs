#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Repair one-sided boat/load references in the PostgreSQL record store.
//!
//! Treats each load's `carrier` as authoritative and prints the pass report
//! as JSON.
//!
//! # Examples
//! ```sh
//! cargo run --manifest-path backend/Cargo.toml --bin harbour-reconcile -- \
//!     --database-url postgres://harbour@localhost/harbour
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use harbour::domain::{AssignmentService, DEFAULT_STORE_BACKOFF, StoreCallPolicy};
use harbour::outbound::persistence::{
    DbPool, DieselBoatRepository, DieselLoadRepository, PoolConfig,
};

/// `harbour-reconcile` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "harbour-reconcile",
    about = "Repair one-sided boat/load references",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `HARBOUR_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", env = "HARBOUR_DATABASE_URL")]
    database_url: Option<String>,
    /// Timeout for each record store call, in milliseconds.
    #[arg(long = "store-timeout-ms", value_name = "ms", default_value_t = 5_000)]
    store_timeout_ms: u64,
    /// Attempts per record store call.
    #[arg(long = "store-attempts", value_name = "n", default_value_t = 3)]
    store_attempts: u32,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .try_init();
    let args = CliArgs::try_parse()?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build reconcile runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let database_url = args
        .database_url
        .ok_or_else(|| eyre!("--database-url or HARBOUR_DATABASE_URL is required"))?;
    let pool = DbPool::new(PoolConfig::new(&database_url))
        .await
        .wrap_err("failed to create database pool")?;
    let policy = StoreCallPolicy::new(
        Duration::from_millis(args.store_timeout_ms),
        args.store_attempts,
        DEFAULT_STORE_BACKOFF,
    );
    let engine = AssignmentService::new(
        Arc::new(DieselBoatRepository::new(pool.clone())),
        Arc::new(DieselLoadRepository::new(pool)),
        policy,
    );

    let report = engine.reconcile().await.wrap_err("reconciliation failed")?;
    info!(clean = report.is_clean(), "reconciliation finished");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
