//! DTO for decoding Google token-info responses.

use serde::Deserialize;

use crate::domain::{IdentityClaims, Subject};

/// Accepted `iss` values for Google-issued ID tokens.
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Deserialize)]
pub(super) struct TokenInfoDto {
    pub(super) aud: String,
    pub(super) iss: String,
    pub(super) sub: String,
    #[serde(default)]
    pub(super) given_name: Option<String>,
    #[serde(default)]
    pub(super) family_name: Option<String>,
}

impl TokenInfoDto {
    /// Check issuer and audience, then map to domain claims.
    pub(super) fn into_claims(self, audience: &str) -> Result<IdentityClaims, String> {
        if !GOOGLE_ISSUERS.contains(&self.iss.as_str()) {
            return Err(format!("unexpected issuer `{}`", self.iss));
        }
        if self.aud != audience {
            return Err("token was issued for another client".to_owned());
        }
        let sub = Subject::new(self.sub).map_err(|error| error.to_string())?;
        Ok(IdentityClaims {
            sub,
            given_name: self.given_name.unwrap_or_default(),
            family_name: self.family_name.unwrap_or_default(),
        })
    }
}
