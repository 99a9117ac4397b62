//! Authentication primitives: identity tokens, verified claims and the
//! principal handlers act on behalf of.
//!
//! Tokens are opaque to the domain. Verification is delegated to the
//! [`IdentityVerifier`](super::ports::IdentityVerifier) port, so no token
//! cryptography happens here.

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::Subject;

/// Raised when an identity token payload is unusable before verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdTokenValidationError {
    /// Token was missing or blank once trimmed.
    #[error("idToken must not be empty")]
    Empty,
}

/// Opaque identity token presented by a client.
///
/// ## Invariants
/// - The token is non-empty once trimmed.
/// - The secret is zeroed on drop and never printed; [`IdToken::fingerprint`]
///   gives a stable, non-reversible handle for logs.
///
/// # Examples
/// ```
/// use harbour::domain::IdToken;
///
/// let token = IdToken::try_from_raw(" eyJhbGciOi.payload.sig ").expect("token");
/// assert_eq!(token.expose(), "eyJhbGciOi.payload.sig");
/// assert_eq!(token.fingerprint().len(), 12);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct IdToken(Zeroizing<String>);

impl IdToken {
    /// Validate a raw token from a request body or `Authorization` header.
    pub fn try_from_raw(raw: &str) -> Result<Self, IdTokenValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdTokenValidationError::Empty);
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// Borrow the secret for forwarding to the identity provider.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Short SHA-256 prefix identifying the token in logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..6])
    }
}

impl fmt::Debug for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdToken").field(&self.fingerprint()).finish()
    }
}

/// Claims the identity provider vouches for once a token verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub sub: Subject,
    pub given_name: String,
    pub family_name: String,
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    sub: Subject,
}

impl Principal {
    /// Wrap an authenticated subject.
    #[must_use]
    pub fn new(sub: Subject) -> Self {
        Self { sub }
    }

    /// Subject the caller authenticated as.
    #[must_use]
    pub fn sub(&self) -> &Subject {
        &self.sub
    }
}

impl From<IdentityClaims> for Principal {
    fn from(claims: IdentityClaims) -> Self {
        Self::new(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_tokens_are_rejected(#[case] raw: &str) {
        assert_eq!(IdToken::try_from_raw(raw), Err(IdTokenValidationError::Empty));
    }

    #[rstest]
    fn debug_output_hides_the_secret() {
        let token = IdToken::try_from_raw("super-secret-token").expect("token");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert!(rendered.contains(&token.fingerprint()));
    }

    #[rstest]
    fn fingerprints_are_stable_per_token() {
        let a = IdToken::try_from_raw("alpha").expect("token");
        let b = IdToken::try_from_raw("beta").expect("token");
        assert_eq!(a.fingerprint(), IdToken::try_from_raw("alpha").expect("token").fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
