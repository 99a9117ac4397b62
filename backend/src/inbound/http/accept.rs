//! JSON-only content negotiation.
//!
//! Every endpoint answers with `application/json`. A request whose `Accept`
//! header rules JSON out is refused with 406 before it reaches a handler.

use actix_web::ResponseError;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::ACCEPT;
use actix_web::middleware::Next;

use crate::domain::Error;

const JSON_RANGES: [&str; 3] = ["application/json", "application/*", "*/*"];

fn range_allows_json(range: &str) -> bool {
    let mut parts = range.split(';').map(str::trim);
    let media = parts.next().unwrap_or_default();
    if !JSON_RANGES.iter().any(|json| media.eq_ignore_ascii_case(json)) {
        return false;
    }
    let refused = parts.any(|param| {
        param.split_once('=').is_some_and(|(name, value)| {
            name.trim().eq_ignore_ascii_case("q")
                && value.trim().parse::<f32>().is_ok_and(|q| q <= 0.0)
        })
    });
    !refused
}

/// Whether an `Accept` header value admits a JSON response.
///
/// A missing header accepts anything.
///
/// # Examples
/// ```
/// use harbour::inbound::http::accept::accepts_json;
///
/// assert!(accepts_json(None));
/// assert!(accepts_json(Some("text/html, application/json;q=0.9")));
/// assert!(!accepts_json(Some("text/html")));
/// ```
#[must_use]
pub fn accepts_json(accept: Option<&str>) -> bool {
    match accept {
        None => true,
        Some(value) if value.trim().is_empty() => true,
        Some(value) => value.split(',').any(range_allows_json),
    }
}

/// Middleware refusing requests that cannot accept JSON.
///
/// Wire it with `actix_web::middleware::from_fn(require_json)`. The refusal
/// is rendered here so outer middleware sees an ordinary 406 response.
pub async fn require_json<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    let accept = req
        .headers()
        .get(ACCEPT)
        .map(|value| value.to_str().unwrap_or_default());
    if !accepts_json(accept) {
        let error = Error::not_acceptable("responses are only available as application/json");
        let response = error.error_response();
        return Ok(req.into_response(response).map_into_right_body());
    }
    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
