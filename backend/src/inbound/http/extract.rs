//! Extractor configuration and path parsing shared by the handlers.
//!
//! Actix answers malformed bodies and query strings with plain-text errors by
//! default. These configs route them through the domain [`Error`] so every
//! failure leaves the process as the same JSON payload.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, web};
use serde_json::json;

use crate::domain::{BoatId, Error, LoadId};

fn body_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let error = match &err {
        JsonPayloadError::ContentType => {
            Error::invalid_request("request body must be application/json")
        }
        JsonPayloadError::Deserialize(inner) => Error::invalid_request("request body is invalid")
            .with_details(json!({ "reason": inner.to_string() })),
        other => Error::invalid_request("request body could not be read")
            .with_details(json!({ "reason": other.to_string() })),
    };
    error.into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request("query string is invalid")
        .with_details(json!({ "reason": err.to_string() }))
        .into()
}

/// JSON body extractor configuration.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(body_error)
}

/// Query string extractor configuration.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error)
}

/// Parse a boat id path segment. Ids that cannot exist read as missing.
pub fn boat_id(raw: &str) -> Result<BoatId, Error> {
    raw.parse()
        .map_err(|_| Error::not_found("boat not found").with_details(json!({ "missing": ["boat"] })))
}

/// Parse a load id path segment. Ids that cannot exist read as missing.
pub fn load_id(raw: &str) -> Result<LoadId, Error> {
    raw.parse()
        .map_err(|_| Error::not_found("load not found").with_details(json!({ "missing": ["load"] })))
}
