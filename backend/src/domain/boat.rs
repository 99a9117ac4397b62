//! Boat record model.
//!
//! A boat is created from a validated [`BoatDraft`] once the store has
//! assigned its key. Its `loads` list mirrors the `carrier` field of each
//! load; only the assignment engine edits it.

use std::fmt;

use super::{BoatId, Load, LoadId, Subject, Version};

/// Maximum length of a boat name in characters.
pub const BOAT_NAME_MAX: usize = 100;
/// Maximum length of a boat type in characters.
pub const BOAT_TYPE_MAX: usize = 64;

/// Validation errors raised while building boat drafts and patches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoatValidationError {
    #[error("name must not be blank")]
    BlankName,
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("type must not be blank")]
    BlankType,
    #[error("type must be at most {max} characters")]
    TypeTooLong { max: usize },
    #[error("length must be a positive integer")]
    InvalidLength,
    #[error("at least one of name, type, length or public must be supplied")]
    EmptyPatch,
}

impl BoatValidationError {
    /// Request field the error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::BlankName | Self::NameTooLong { .. } => Some("name"),
            Self::BlankType | Self::TypeTooLong { .. } => Some("type"),
            Self::InvalidLength => Some("length"),
            Self::EmptyPatch => None,
        }
    }
}

/// Boat name; unique across boats by exact, case-sensitive match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoatName(String);

impl BoatName {
    /// Validate a boat name.
    pub fn new(raw: impl Into<String>) -> Result<Self, BoatValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(BoatValidationError::BlankName);
        }
        if raw.chars().count() > BOAT_NAME_MAX {
            return Err(BoatValidationError::NameTooLong { max: BOAT_NAME_MAX });
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for BoatName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BoatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_type(raw: String) -> Result<String, BoatValidationError> {
    if raw.trim().is_empty() {
        return Err(BoatValidationError::BlankType);
    }
    if raw.chars().count() > BOAT_TYPE_MAX {
        return Err(BoatValidationError::TypeTooLong { max: BOAT_TYPE_MAX });
    }
    Ok(raw)
}

fn validate_length(raw: i64) -> Result<u32, BoatValidationError> {
    u32::try_from(raw)
        .ok()
        .filter(|length| *length > 0)
        .ok_or(BoatValidationError::InvalidLength)
}

/// Validated input for creating or fully replacing a boat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoatDraft {
    pub name: BoatName,
    pub boat_type: String,
    pub length: u32,
    pub public: bool,
}

impl BoatDraft {
    /// Validate the raw request fields of a boat.
    ///
    /// # Examples
    /// ```
    /// use harbour::domain::BoatDraft;
    ///
    /// let draft = BoatDraft::try_from_parts("Orca", "Catamaran", 28, true).expect("valid boat");
    /// assert_eq!(draft.name.as_ref(), "Orca");
    /// assert!(BoatDraft::try_from_parts("Orca", "Catamaran", 0, true).is_err());
    /// ```
    pub fn try_from_parts(
        name: impl Into<String>,
        boat_type: impl Into<String>,
        length: i64,
        public: bool,
    ) -> Result<Self, BoatValidationError> {
        Ok(Self {
            name: BoatName::new(name)?,
            boat_type: validate_type(boat_type.into())?,
            length: validate_length(length)?,
            public,
        })
    }
}

/// Validated partial update of a boat; at least one field is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoatPatch {
    pub name: Option<BoatName>,
    pub boat_type: Option<String>,
    pub length: Option<u32>,
    pub public: Option<bool>,
}

impl BoatPatch {
    /// Validate the fields present in a partial update.
    pub fn try_from_parts(
        name: Option<String>,
        boat_type: Option<String>,
        length: Option<i64>,
        public: Option<bool>,
    ) -> Result<Self, BoatValidationError> {
        if name.is_none() && boat_type.is_none() && length.is_none() && public.is_none() {
            return Err(BoatValidationError::EmptyPatch);
        }
        Ok(Self {
            name: name.map(BoatName::new).transpose()?,
            boat_type: boat_type.map(validate_type).transpose()?,
            length: length.map(validate_length).transpose()?,
            public,
        })
    }
}

/// Stored boat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boat {
    pub id: BoatId,
    pub version: Version,
    pub owner: Subject,
    pub name: BoatName,
    pub boat_type: String,
    pub length: u32,
    pub public: bool,
    pub loads: Vec<LoadId>,
}

impl Boat {
    /// Build the record for a draft the store has just keyed.
    #[must_use]
    pub fn from_draft(id: BoatId, owner: Subject, draft: BoatDraft) -> Self {
        let BoatDraft {
            name,
            boat_type,
            length,
            public,
        } = draft;
        Self {
            id,
            version: Version::INITIAL,
            owner,
            name,
            boat_type,
            length,
            public,
            loads: Vec::new(),
        }
    }

    /// Whether `sub` created this boat.
    #[must_use]
    pub fn is_owned_by(&self, sub: &Subject) -> bool {
        &self.owner == sub
    }

    /// Public boats are visible to everyone; private ones to their owner.
    #[must_use]
    pub fn is_visible_to(&self, viewer: Option<&Subject>) -> bool {
        self.public || viewer.is_some_and(|sub| self.is_owned_by(sub))
    }

    /// Whether the boat holds a reference to `load`.
    #[must_use]
    pub fn holds(&self, load: LoadId) -> bool {
        self.loads.contains(&load)
    }

    /// Append a load reference unless it is already held.
    pub fn attach(&mut self, load: LoadId) -> bool {
        if self.holds(load) {
            return false;
        }
        self.loads.push(load);
        true
    }

    /// Remove every reference to `load`, keeping the order of the rest.
    pub fn detach(&mut self, load: LoadId) -> bool {
        let before = self.loads.len();
        self.loads.retain(|held| *held != load);
        self.loads.len() != before
    }

    /// Overwrite the descriptive fields; `loads` and `owner` are untouched.
    pub fn replace_details(&mut self, draft: BoatDraft) {
        self.name = draft.name;
        self.boat_type = draft.boat_type;
        self.length = draft.length;
        self.public = draft.public;
    }

    /// Apply the fields present in `patch`.
    pub fn apply_patch(&mut self, patch: BoatPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(boat_type) = patch.boat_type {
            self.boat_type = boat_type;
        }
        if let Some(length) = patch.length {
            self.length = length;
        }
        if let Some(public) = patch.public {
            self.public = public;
        }
    }
}

/// A boat together with the loads its references were verified against.
///
/// `loads` holds only loads that exist and name this boat as carrier, in the
/// order the boat lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydratedBoat {
    pub boat: Boat,
    pub loads: Vec<Load>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn orca() -> Boat {
        let draft = BoatDraft::try_from_parts("Orca", "Catamaran", 28, false).expect("draft");
        Boat::from_draft(
            BoatId::new(1).expect("id"),
            Subject::new("owner-sub").expect("sub"),
            draft,
        )
    }

    fn load(raw: i64) -> LoadId {
        LoadId::new(raw).expect("load id")
    }

    #[rstest]
    #[case("", "Sloop", 10, BoatValidationError::BlankName)]
    #[case("   ", "Sloop", 10, BoatValidationError::BlankName)]
    #[case("Orca", " ", 10, BoatValidationError::BlankType)]
    #[case("Orca", "Sloop", 0, BoatValidationError::InvalidLength)]
    #[case("Orca", "Sloop", -4, BoatValidationError::InvalidLength)]
    #[case("Orca", "Sloop", i64::MAX, BoatValidationError::InvalidLength)]
    fn drafts_reject_invalid_fields(
        #[case] name: &str,
        #[case] boat_type: &str,
        #[case] length: i64,
        #[case] expected: BoatValidationError,
    ) {
        let err = BoatDraft::try_from_parts(name, boat_type, length, true).expect_err("invalid");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn overlong_names_are_rejected() {
        let name = "x".repeat(BOAT_NAME_MAX + 1);
        let err = BoatName::new(name).expect_err("too long");
        assert_eq!(err.field(), Some("name"));
    }

    #[rstest]
    fn empty_patches_are_rejected() {
        let err = BoatPatch::try_from_parts(None, None, None, None).expect_err("empty");
        assert_eq!(err, BoatValidationError::EmptyPatch);
    }

    #[rstest]
    fn from_draft_starts_empty_at_initial_version(orca: Boat) {
        assert!(orca.loads.is_empty());
        assert_eq!(orca.version, Version::INITIAL);
    }

    #[rstest]
    #[case(true, None, true)]
    #[case(false, None, false)]
    #[case(false, Some("owner-sub"), true)]
    #[case(false, Some("someone-else"), false)]
    fn visibility_follows_owner_and_public_flag(
        mut orca: Boat,
        #[case] public: bool,
        #[case] viewer: Option<&str>,
        #[case] visible: bool,
    ) {
        orca.public = public;
        let viewer = viewer.map(|raw| Subject::new(raw).expect("sub"));
        assert_eq!(orca.is_visible_to(viewer.as_ref()), visible);
    }

    #[rstest]
    fn attach_is_idempotent_and_detach_keeps_order(mut orca: Boat) {
        assert!(orca.attach(load(9)));
        assert!(orca.attach(load(3)));
        assert!(!orca.attach(load(9)));
        assert!(orca.attach(load(5)));
        assert!(orca.detach(load(3)));
        assert!(!orca.detach(load(3)));
        assert_eq!(orca.loads, vec![load(9), load(5)]);
    }

    #[rstest]
    fn patch_only_touches_supplied_fields(mut orca: Boat) {
        orca.attach(load(9));
        let patch = BoatPatch::try_from_parts(None, None, Some(30), Some(true)).expect("patch");
        orca.apply_patch(patch);
        assert_eq!(orca.name.as_ref(), "Orca");
        assert_eq!(orca.length, 30);
        assert!(orca.public);
        assert_eq!(orca.loads, vec![load(9)]);
    }
}
