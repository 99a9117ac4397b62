//! Identity provider adapters.
//!
//! This module provides a reqwest implementation of the `IdentityVerifier`
//! port backed by Google's token-info endpoint.

mod dto;
mod google_tokeninfo;

pub use google_tokeninfo::{DEFAULT_TOKENINFO_URL, GoogleTokenInfoVerifier};
