//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::web;

use crate::domain::ports::FixtureIdentityVerifier;
use crate::outbound::memory::MemoryRecordStore;
use crate::server::memory_ports;

use super::state::{HttpState, PageLimits};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// HTTP state over an empty in-memory store and the fixture verifier.
pub fn memory_state() -> web::Data<HttpState> {
    memory_state_with(PageLimits::default())
}

/// [`memory_state`] with custom page bounds.
pub fn memory_state_with(page_limits: PageLimits) -> web::Data<HttpState> {
    let store = Arc::new(MemoryRecordStore::new());
    let ports = memory_ports(store, Arc::new(FixtureIdentityVerifier));
    web::Data::new(HttpState::new(ports, page_limits))
}
