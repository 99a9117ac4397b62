//! Listing helpers bridging `pagination` cursors and domain pages.

use actix_web::HttpRequest;
use pagination::{Cursor, PageParams, Paginated};
use serde_json::json;

use crate::domain::{Error, PageRequest, RecordPage};

use super::links::Links;
use super::state::PageLimits;

/// Resolve query parameters into a domain page request.
///
/// # Errors
///
/// Returns `invalid_request` when the cursor cannot be decoded.
pub fn page_request(params: &PageParams, limits: PageLimits) -> Result<PageRequest, Error> {
    let cursor = params.decode_cursor::<i64>().map_err(|err| {
        Error::invalid_request("cursor is not valid")
            .with_details(json!({ "field": "cursor", "reason": err.to_string() }))
    })?;
    Ok(PageRequest {
        after: cursor.map(Cursor::into_key),
        limit: params.limit(limits.default, limits.max),
    })
}

/// Wrap a page of records in the response envelope.
///
/// `key` yields the ordering key of a record; the key of the last record on
/// a page with more to come becomes the `next` cursor.
pub fn envelope<T, U>(
    req: &HttpRequest,
    links: &Links,
    request: PageRequest,
    page: RecordPage<T>,
    key: impl Fn(&T) -> i64,
    project: impl FnMut(T) -> U,
) -> Result<Paginated<U>, Error> {
    let next_key = page
        .has_more
        .then(|| page.items.last().map(&key))
        .flatten();
    let envelope = Paginated::new(page.items, page.total);
    let envelope = match next_key {
        Some(after) => {
            let cursor = Cursor::new(after)
                .encode()
                .map_err(|err| Error::internal(format!("failed to encode cursor: {err}")))?;
            envelope.with_next(&links.current(req)?, &cursor, request.limit)
        }
        None => envelope,
    };
    Ok(envelope.map(project))
}
