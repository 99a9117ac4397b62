//! Primitives shared by every stored record: identifiers, version tokens and
//! keyset pages.

use std::fmt;
use std::str::FromStr;

/// Raised when a textual identifier does not name a stored record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{value}` is not a record identifier")]
pub struct RecordIdParseError {
    value: String,
}

macro_rules! define_record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a store-assigned key; keys are strictly positive.
            #[must_use]
            pub fn new(raw: i64) -> Option<Self> {
                (raw > 0).then_some(Self(raw))
            }

            /// Raw key as held by the store.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = RecordIdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>()
                    .ok()
                    .and_then(Self::new)
                    .ok_or_else(|| RecordIdParseError { value: s.to_owned() })
            }
        }
    };
}

define_record_id! {
    /// Store-assigned key of a boat.
    BoatId
}

define_record_id! {
    /// Store-assigned key of a load.
    LoadId
}

define_record_id! {
    /// Store-assigned key of a user.
    UserId
}

/// Optimistic concurrency token bumped on every write to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(i64);

impl Version {
    /// Version carried by a freshly inserted record.
    pub const INITIAL: Self = Self(1);

    /// Rehydrate a version read from storage.
    #[must_use]
    pub const fn from_stored(raw: i64) -> Self {
        Self(raw)
    }

    /// Version the record carries after the next successful write.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw value as held by the store.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keyset position and size for a listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Only records with a key strictly greater than this are returned.
    pub after: Option<i64>,
    /// Maximum number of records on the page.
    pub limit: u32,
}

impl PageRequest {
    /// First page of `limit` records.
    #[must_use]
    pub const fn first(limit: u32) -> Self {
        Self { after: None, limit }
    }
}

/// One page of records in ascending key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPage<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Number of records matching the filter across all pages.
    pub total: u64,
    /// Whether records remain after the last item.
    pub has_more: bool,
}

impl<T> RecordPage<T> {
    /// A page with no records.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: false,
        }
    }

    /// Transform the records while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> RecordPage<U> {
        RecordPage {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", Some(1))]
    #[case("42", Some(42))]
    #[case("0", None)]
    #[case("-3", None)]
    #[case("orca", None)]
    #[case("", None)]
    fn boat_ids_parse_positive_integers(#[case] raw: &str, #[case] expected: Option<i64>) {
        let parsed = raw.parse::<BoatId>().ok().map(BoatId::get);
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn versions_advance_monotonically() {
        let v = Version::INITIAL;
        assert!(v.next() > v);
        assert_eq!(v.next().get(), 2);
    }

    #[rstest]
    fn page_map_keeps_metadata() {
        let page = RecordPage {
            items: vec![1, 2],
            total: 9,
            has_more: true,
        }
        .map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 9);
        assert!(page.has_more);
    }
}
