//! Server settings loaded via OrthoConfig.
//!
//! Every value can come from `HARBOUR_*` environment variables, CLI flags or
//! a configuration file; unset values fall back to the defaults below.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{
    DEFAULT_STORE_ATTEMPTS, DEFAULT_STORE_BACKOFF, DEFAULT_STORE_TIMEOUT, StoreCallPolicy,
};
use crate::inbound::http::state::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageLimits};
use crate::outbound::identity::DEFAULT_TOKENINFO_URL;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings rejected after loading.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("bind address {value:?} is not a socket address: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("token info URL {value:?} is invalid: {source}")]
    TokenInfoUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("page size {default} must be between 1 and the maximum {max}")]
    PageSize { default: u32, max: u32 },
}

/// Configuration values for the Harbour server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HARBOUR")]
pub struct HarbourSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL. The in-memory store is used when unset.
    pub database_url: Option<String>,
    /// OAuth client id that ID tokens must be issued to.
    pub google_client_id: Option<String>,
    /// Override for the token-info endpoint.
    pub tokeninfo_url: Option<String>,
    /// Timeout for identity provider calls, in milliseconds.
    pub identity_timeout_ms: Option<u64>,
    /// Accept `fixture.<sub>` tokens instead of calling the provider.
    #[ortho_config(default = false)]
    pub fixture_identity: bool,
    /// Records per listing page when the client sends no `limit`.
    pub page_size: Option<u32>,
    /// Largest `limit` a client may request.
    pub max_page_size: Option<u32>,
    /// Timeout for each record store call, in milliseconds.
    pub store_timeout_ms: Option<u64>,
    /// Attempts per record store call.
    pub store_attempts: Option<u32>,
    /// Base retry backoff, in milliseconds.
    pub store_backoff_ms: Option<u64>,
}

impl HarbourSettings {
    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Token-info endpoint for the Google verifier.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::TokenInfoUrl`] when the value does not parse.
    pub fn tokeninfo_url(&self) -> Result<Url, SettingsError> {
        let value = self.tokeninfo_url.as_deref().unwrap_or(DEFAULT_TOKENINFO_URL);
        Url::parse(value).map_err(|source| SettingsError::TokenInfoUrl {
            value: value.to_owned(),
            source,
        })
    }

    pub fn identity_timeout(&self) -> Duration {
        self.identity_timeout_ms
            .map_or(DEFAULT_IDENTITY_TIMEOUT, Duration::from_millis)
    }

    /// Listing bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::PageSize`] when the default page is empty or
    /// larger than the maximum.
    pub fn page_limits(&self) -> Result<PageLimits, SettingsError> {
        let default = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let max = self.max_page_size.unwrap_or(MAX_PAGE_SIZE);
        if default == 0 || default > max {
            return Err(SettingsError::PageSize { default, max });
        }
        Ok(PageLimits { default, max })
    }

    /// Timeout and retry policy for record store calls.
    pub fn store_call_policy(&self) -> StoreCallPolicy {
        StoreCallPolicy::new(
            self.store_timeout_ms
                .map_or(DEFAULT_STORE_TIMEOUT, Duration::from_millis),
            self.store_attempts.unwrap_or(DEFAULT_STORE_ATTEMPTS),
            self.store_backoff_ms
                .map_or(DEFAULT_STORE_BACKOFF, Duration::from_millis),
        )
    }
}
