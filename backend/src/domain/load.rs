//! Load record model.
//!
//! `carrier` is the authoritative side of the boat/load relationship. Record
//! services never write it; the assignment engine is its only writer.

use chrono::NaiveDate;

use super::{BoatId, LoadId, Version};

/// Maximum length of a load's content description in characters.
pub const LOAD_CONTENT_MAX: usize = 256;
/// Wire format of `creation_date`.
pub const CREATION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation errors raised while building load drafts and patches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadValidationError {
    #[error("volume must be a positive integer")]
    InvalidVolume,
    #[error("content must not be blank")]
    BlankContent,
    #[error("content must be at most {max} characters")]
    ContentTooLong { max: usize },
    #[error("creation_date must be a calendar date formatted YYYY-MM-DD")]
    InvalidCreationDate,
    #[error("at least one of volume, content or creation_date must be supplied")]
    EmptyPatch,
}

impl LoadValidationError {
    /// Request field the error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidVolume => Some("volume"),
            Self::BlankContent | Self::ContentTooLong { .. } => Some("content"),
            Self::InvalidCreationDate => Some("creation_date"),
            Self::EmptyPatch => None,
        }
    }
}

fn validate_volume(raw: i64) -> Result<u32, LoadValidationError> {
    u32::try_from(raw)
        .ok()
        .filter(|volume| *volume > 0)
        .ok_or(LoadValidationError::InvalidVolume)
}

fn validate_content(raw: String) -> Result<String, LoadValidationError> {
    if raw.trim().is_empty() {
        return Err(LoadValidationError::BlankContent);
    }
    if raw.chars().count() > LOAD_CONTENT_MAX {
        return Err(LoadValidationError::ContentTooLong {
            max: LOAD_CONTENT_MAX,
        });
    }
    Ok(raw)
}

fn parse_creation_date(raw: &str) -> Result<NaiveDate, LoadValidationError> {
    NaiveDate::parse_from_str(raw, CREATION_DATE_FORMAT)
        .map_err(|_| LoadValidationError::InvalidCreationDate)
}

/// Validated input for creating or fully replacing a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadDraft {
    pub volume: u32,
    pub content: String,
    pub creation_date: NaiveDate,
}

impl LoadDraft {
    /// Validate the raw request fields of a load.
    ///
    /// # Examples
    /// ```
    /// use harbour::domain::LoadDraft;
    ///
    /// let draft = LoadDraft::try_from_parts(5, "LEGO blocks", "2024-03-01").expect("valid load");
    /// assert_eq!(draft.volume, 5);
    /// assert!(LoadDraft::try_from_parts(5, "LEGO blocks", "01/03/2024").is_err());
    /// ```
    pub fn try_from_parts(
        volume: i64,
        content: impl Into<String>,
        creation_date: &str,
    ) -> Result<Self, LoadValidationError> {
        Ok(Self {
            volume: validate_volume(volume)?,
            content: validate_content(content.into())?,
            creation_date: parse_creation_date(creation_date)?,
        })
    }
}

/// Validated partial update of a load; at least one field is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadPatch {
    pub volume: Option<u32>,
    pub content: Option<String>,
    pub creation_date: Option<NaiveDate>,
}

impl LoadPatch {
    /// Validate the fields present in a partial update.
    pub fn try_from_parts(
        volume: Option<i64>,
        content: Option<String>,
        creation_date: Option<&str>,
    ) -> Result<Self, LoadValidationError> {
        if volume.is_none() && content.is_none() && creation_date.is_none() {
            return Err(LoadValidationError::EmptyPatch);
        }
        Ok(Self {
            volume: volume.map(validate_volume).transpose()?,
            content: content.map(validate_content).transpose()?,
            creation_date: creation_date.map(parse_creation_date).transpose()?,
        })
    }
}

/// Stored load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Load {
    pub id: LoadId,
    pub version: Version,
    pub volume: u32,
    pub content: String,
    pub creation_date: NaiveDate,
    pub carrier: Option<BoatId>,
}

impl Load {
    /// Build the record for a draft the store has just keyed. New loads are
    /// never on a boat.
    #[must_use]
    pub fn from_draft(id: LoadId, draft: LoadDraft) -> Self {
        let LoadDraft {
            volume,
            content,
            creation_date,
        } = draft;
        Self {
            id,
            version: Version::INITIAL,
            volume,
            content,
            creation_date,
            carrier: None,
        }
    }

    /// Whether the load is currently carried by `boat`.
    #[must_use]
    pub fn is_carried_by(&self, boat: BoatId) -> bool {
        self.carrier == Some(boat)
    }

    /// Overwrite the descriptive fields; `carrier` is untouched.
    pub fn replace_details(&mut self, draft: LoadDraft) {
        self.volume = draft.volume;
        self.content = draft.content;
        self.creation_date = draft.creation_date;
    }

    /// Apply the fields present in `patch`.
    pub fn apply_patch(&mut self, patch: LoadPatch) {
        if let Some(volume) = patch.volume {
            self.volume = volume;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(creation_date) = patch.creation_date {
            self.creation_date = creation_date;
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "Crates", "2024-03-01", LoadValidationError::InvalidVolume)]
    #[case(-1, "Crates", "2024-03-01", LoadValidationError::InvalidVolume)]
    #[case(5, "  ", "2024-03-01", LoadValidationError::BlankContent)]
    #[case(5, "Crates", "2024-02-30", LoadValidationError::InvalidCreationDate)]
    #[case(5, "Crates", "1/3/2024", LoadValidationError::InvalidCreationDate)]
    fn drafts_reject_invalid_fields(
        #[case] volume: i64,
        #[case] content: &str,
        #[case] date: &str,
        #[case] expected: LoadValidationError,
    ) {
        let err = LoadDraft::try_from_parts(volume, content, date).expect_err("invalid");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn new_loads_have_no_carrier() {
        let draft = LoadDraft::try_from_parts(5, "Crates", "2024-03-01").expect("draft");
        let load = Load::from_draft(LoadId::new(9).expect("id"), draft);
        assert!(load.carrier.is_none());
        assert_eq!(load.version, Version::INITIAL);
    }

    #[rstest]
    fn patch_keeps_carrier() {
        let draft = LoadDraft::try_from_parts(5, "Crates", "2024-03-01").expect("draft");
        let mut load = Load::from_draft(LoadId::new(9).expect("id"), draft);
        let boat = BoatId::new(1).expect("boat id");
        load.carrier = Some(boat);
        load.apply_patch(LoadPatch::try_from_parts(Some(7), None, None).expect("patch"));
        assert_eq!(load.volume, 7);
        assert!(load.is_carried_by(boat));
    }

    #[rstest]
    fn empty_patches_are_rejected() {
        let err = LoadPatch::try_from_parts(None, None, None).expect_err("empty");
        assert_eq!(err.field(), None);
    }
}
