//! User data model.
//!
//! Users are created once, on their first successful login, and are never
//! updated afterwards. The identity provider's `sub` is the join key for
//! every resource a user owns.

use std::fmt;

use chrono::NaiveDate;

use super::UserId;

/// Maximum length accepted for an identity subject.
pub const SUBJECT_MAX: usize = 255;

/// Validation errors for user fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The subject was empty after trimming.
    #[error("subject must not be blank")]
    BlankSubject,
    /// The subject exceeded [`SUBJECT_MAX`] bytes.
    #[error("subject must be at most {max} characters")]
    SubjectTooLong { max: usize },
}

/// Identity-provider subject identifying a principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject(String);

impl Subject {
    /// Validate and construct a subject.
    ///
    /// # Examples
    /// ```
    /// use harbour::domain::Subject;
    ///
    /// let sub = Subject::new("110169484474386276334").expect("valid subject");
    /// assert_eq!(sub.as_ref(), "110169484474386276334");
    /// assert!(Subject::new("  ").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(UserValidationError::BlankSubject);
        }
        if raw.len() > SUBJECT_MAX {
            return Err(UserValidationError::SubjectTooLong { max: SUBJECT_MAX });
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for Subject {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User fields captured on first login, before the store assigns a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub sub: Subject,
    pub first_name: String,
    pub last_name: String,
    pub account_created: NaiveDate,
}

/// Stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub sub: Subject,
    pub first_name: String,
    pub last_name: String,
    pub account_created: NaiveDate,
}

impl User {
    /// Build the record for a new user the store has just keyed.
    #[must_use]
    pub fn from_new(id: UserId, new_user: NewUser) -> Self {
        let NewUser {
            sub,
            first_name,
            last_name,
            account_created,
        } = new_user;
        Self {
            id,
            sub,
            first_name,
            last_name,
            account_created,
        }
    }
}
