//! Tests for HTTP error mapping.

use super::*;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_error() -> Error {
    Error::internal("pool exhausted at 10.0.0.7")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"dsn": "postgres://secret"}))
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("login required"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("not your boat"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("boat not found"), StatusCode::NOT_FOUND)]
#[case(Error::not_acceptable("json only"), StatusCode::NOT_ACCEPTABLE)]
#[case(Error::conflict("boat name already in use"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("store down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

async fn body_of(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii header").to_owned());
    let bytes = to_bytes(response.into_body()).await.expect("body");
    let payload = serde_json::from_slice(&bytes).expect("json payload");
    (status, header, payload)
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted(internal_error: Error) {
    let (status, header, payload) = body_of(&internal_error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(
        payload,
        json!({
            "code": "internal_error",
            "message": "Internal server error",
            "traceId": TRACE_ID,
        })
    );
}

#[rstest]
#[actix_web::test]
async fn conflict_payloads_keep_their_details() {
    let error = Error::conflict("load already assigned to this boat")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"code": "already_assigned_here"}));

    let (status, header, payload) = body_of(&error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(payload["code"], "conflict");
    assert_eq!(payload["details"]["code"], "already_assigned_here");
}

#[rstest]
#[actix_web::test]
async fn errors_without_trace_id_omit_the_header() {
    let error = Error::not_found("load not found");

    let (_, header, payload) = body_of(&error).await;

    assert!(header.is_none());
    assert!(payload.get("traceId").is_none());
}

#[rstest]
fn actix_errors_become_redacted_internal_errors() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}
