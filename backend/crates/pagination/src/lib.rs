//! Opaque cursor and pagination envelope primitives.
//!
//! Endpoints page through records in ascending key order. The position is
//! carried between requests as an opaque, URL-safe cursor so clients never
//! depend on the key representation. Responses wrap a page of items in a
//! [`Paginated`] envelope which carries an absolute `next` link when more
//! items remain.
//!
//! # Examples
//! ```
//! use pagination::{Cursor, PageParams, Paginated};
//! use url::Url;
//!
//! let params = PageParams::default();
//! assert_eq!(params.limit(5, 100), 5);
//!
//! let cursor = Cursor::new(42_i64).encode().expect("encode cursor");
//! let decoded: Cursor<i64> = Cursor::decode(&cursor).expect("decode cursor");
//! assert_eq!(decoded.into_key(), 42);
//!
//! let base = Url::parse("https://example.test/api/v1/boats").expect("url");
//! let page = Paginated::new(vec!["a", "b"], 7).with_next(&base, &cursor, 2);
//! assert!(page.next.is_some());
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameter carrying the encoded cursor.
pub const CURSOR_PARAM: &str = "cursor";
/// Query parameter carrying the requested page size.
pub const LIMIT_PARAM: &str = "limit";

/// Errors raised while encoding or decoding cursors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The cursor is not valid URL-safe base64.
    #[error("cursor is not valid base64: {message}")]
    Encoding {
        /// Decoder failure description.
        message: String,
    },
    /// The decoded cursor payload does not describe a key.
    #[error("cursor payload is malformed: {message}")]
    Payload {
        /// Serialisation failure description.
        message: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorPayload<K> {
    after: K,
}

/// Position within an ordered listing: the last key the client has seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<K> {
    key: K,
}

impl<K> Cursor<K> {
    /// Build a cursor pointing just after `key`.
    pub const fn new(key: K) -> Self {
        Self { key }
    }

    /// Borrow the key the cursor points after.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Consume the cursor, returning its key.
    pub fn into_key(self) -> K {
        self.key
    }
}

impl<K: Serialize> Cursor<K> {
    /// Encode the cursor as an opaque URL-safe token.
    ///
    /// # Errors
    /// Returns [`CursorError::Payload`] when the key cannot be serialised.
    pub fn encode(&self) -> Result<String, CursorError> {
        let json = serde_json::to_vec(&CursorPayload { after: &self.key }).map_err(|err| {
            CursorError::Payload {
                message: err.to_string(),
            }
        })?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

impl<K: DeserializeOwned> Cursor<K> {
    /// Decode an opaque token produced by [`Cursor::encode`].
    ///
    /// # Errors
    /// Returns [`CursorError::Encoding`] for invalid base64 and
    /// [`CursorError::Payload`] when the payload does not hold a key.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|err| CursorError::Encoding {
                message: err.to_string(),
            })?;
        let payload: CursorPayload<K> =
            serde_json::from_slice(&bytes).map_err(|err| CursorError::Payload {
                message: err.to_string(),
            })?;
        Ok(Self::new(payload.after))
    }
}

/// Paging parameters accepted on listing endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageParams {
    /// Opaque cursor returned in a previous `next` link.
    pub cursor: Option<String>,
    /// Requested page size.
    pub limit: Option<u32>,
}

impl PageParams {
    /// Resolve the effective page size, clamped to `1..=max`.
    #[must_use]
    pub fn limit(&self, default: u32, max: u32) -> u32 {
        let ceiling = max.max(1);
        self.limit.unwrap_or(default).clamp(1, ceiling)
    }

    /// Decode the cursor, if one was supplied.
    ///
    /// # Errors
    /// Propagates [`CursorError`] for malformed tokens.
    pub fn decode_cursor<K: DeserializeOwned>(&self) -> Result<Option<Cursor<K>>, CursorError> {
        self.cursor.as_deref().map(Cursor::decode).transpose()
    }
}

/// Response envelope for a page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paginated<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Number of items matching the listing across all pages.
    pub total: u64,
    /// Absolute link to the following page, present when more items remain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl<T> Paginated<T> {
    /// Build an envelope without a `next` link.
    #[must_use]
    pub const fn new(data: Vec<T>, total: u64) -> Self {
        Self {
            data,
            total,
            next: None,
        }
    }

    /// Attach a `next` link derived from `base`, replacing any existing paging
    /// parameters while keeping unrelated query parameters.
    #[must_use]
    pub fn with_next(mut self, base: &Url, cursor: &str, limit: u32) -> Self {
        self.next = Some(next_link(base, cursor, limit).into());
        self
    }

    /// Transform the items while keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            next: self.next,
        }
    }
}

/// Build the link for the page following `cursor`.
#[must_use]
pub fn next_link(base: &Url, cursor: &str, limit: u32) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(name, _)| name != CURSOR_PARAM && name != LIMIT_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    let mut link = base.clone();
    link.set_query(None);
    {
        let mut pairs = link.query_pairs_mut();
        for (name, value) in &retained {
            pairs.append_pair(name, value);
        }
        pairs.append_pair(CURSOR_PARAM, cursor);
        pairs.append_pair(LIMIT_PARAM, &limit.to_string());
    }
    link
}

#[cfg(test)]
mod tests {
    //! Unit coverage for cursor encoding and envelope links.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1_i64)]
    #[case(9_007_199_254_740_993_i64)]
    fn cursor_round_trips_keys(#[case] key: i64) {
        let token = Cursor::new(key).encode().expect("encode");
        let decoded: Cursor<i64> = Cursor::decode(&token).expect("decode");
        assert_eq!(*decoded.key(), key);
    }

    #[rstest]
    fn cursor_tokens_are_url_safe() {
        let token = Cursor::new("a/b+c?".to_owned()).encode().expect("encode");
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[rstest]
    #[case("***")]
    #[case("e30")]
    fn malformed_cursors_are_rejected(#[case] token: &str) {
        let result: Result<Cursor<i64>, _> = Cursor::decode(token);
        assert!(result.is_err(), "token {token} should be rejected");
    }

    #[rstest]
    #[case(None, 5)]
    #[case(Some(0), 1)]
    #[case(Some(3), 3)]
    #[case(Some(500), 100)]
    fn limit_is_clamped(#[case] requested: Option<u32>, #[case] expected: u32) {
        let params = PageParams {
            cursor: None,
            limit: requested,
        };
        assert_eq!(params.limit(5, 100), expected);
    }

    #[rstest]
    fn next_link_replaces_paging_parameters() {
        let base =
            Url::parse("https://harbour.test/api/v1/boats?cursor=old&limit=2&sort=id").expect("url");
        let link = next_link(&base, "abc", 5);
        let pairs: Vec<(String, String)> = link
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("sort".to_owned(), "id".to_owned()),
                ("cursor".to_owned(), "abc".to_owned()),
                ("limit".to_owned(), "5".to_owned()),
            ]
        );
    }

    #[rstest]
    fn envelope_omits_next_when_absent() {
        let page = Paginated::new(vec![1, 2], 2);
        let json = serde_json::to_value(&page).expect("serialise");
        assert!(json.get("next").is_none());
        assert_eq!(json.get("total").and_then(serde_json::Value::as_u64), Some(2));
    }
}
