#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Harbour entry-point: loads settings, picks the record store and identity
//! verifier, and serves the REST API.

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use harbour::domain::ports::{FixtureIdentityVerifier, IdentityVerifier};
use harbour::inbound::http::health::HealthState;
use harbour::inbound::http::session_config::{BuildMode, session_settings_from_env};
use harbour::inbound::http::state::HttpState;
use harbour::outbound::identity::GoogleTokenInfoVerifier;
use harbour::outbound::memory::MemoryRecordStore;
use harbour::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use harbour::server::{
    AppDependencies, HarbourSettings, create_server, diesel_ports, memory_ports_with,
};
use ortho_config::OrthoConfig;

fn identity_verifier(settings: &HarbourSettings) -> Result<Arc<dyn IdentityVerifier>> {
    if settings.fixture_identity {
        if !cfg!(debug_assertions) {
            return Err(eyre!("fixture identity tokens are not accepted in release builds"));
        }
        warn!("accepting fixture identity tokens (dev only)");
        return Ok(Arc::new(FixtureIdentityVerifier));
    }
    let client_id = settings
        .google_client_id
        .as_deref()
        .ok_or_else(|| eyre!("HARBOUR_GOOGLE_CLIENT_ID is required"))?;
    let verifier = GoogleTokenInfoVerifier::new(
        settings.tokeninfo_url()?,
        client_id,
        settings.identity_timeout(),
    )
    .wrap_err("failed to build the identity provider client")?;
    Ok(Arc::new(verifier))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = HarbourSettings::load().wrap_err("failed to load settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    let verifier = identity_verifier(&settings)?;
    let policy = settings.store_call_policy();

    let ports = match settings.database_url.as_deref() {
        Some(url) => {
            let applied = run_migrations(url)
                .await
                .wrap_err("failed to apply migrations")?;
            info!(applied, "record store schema is current");
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .wrap_err("failed to create database pool")?;
            diesel_ports(&pool, verifier, policy)
        }
        None => {
            warn!("no database URL configured; records live in memory only");
            memory_ports_with(Arc::new(MemoryRecordStore::new()), verifier, policy)
        }
    };

    let bind_addr = settings.bind_addr()?;
    let deps = AppDependencies {
        health_state: web::Data::new(HealthState::new()),
        http_state: web::Data::new(HttpState::new(ports, settings.page_limits()?)),
        key: session.key,
        cookie_secure: session.cookie_secure,
    };
    info!(%bind_addr, "starting harbour");
    create_server(deps, bind_addr)?.await?;
    Ok(())
}
