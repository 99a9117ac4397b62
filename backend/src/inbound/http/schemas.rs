//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist or is not visible.
    #[schema(rename = "not_found")]
    NotFound,
    /// The client does not accept JSON.
    #[schema(rename = "not_acceptable")]
    NotAcceptable,
    /// The request conflicts with the stored state.
    #[schema(rename = "conflict")]
    Conflict,
    /// A dependency such as the record store is unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// `details.missing` lists the missing records of a failed assignment;
/// `details.code` refines a conflict; `details.field` names the invalid
/// request field.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "load is already assigned to another boat")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "00000000-0000-0000-0000-000000000000")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    #[schema(example = json!({ "code": "assigned_elsewhere" }))]
    details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[test]
    fn error_schema_has_expected_name_and_wire_fields() {
        let schema_json = schema_to_json::<ErrorSchema>();
        // utoipa replaces :: with . in schema names
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
        assert!(schema_json.contains("message"));
        assert!(
            schema_json.contains("traceId"),
            "schema should use the camelCase wire name"
        );
    }

    #[rstest]
    #[case("invalid_request")]
    #[case("unauthorized")]
    #[case("forbidden")]
    #[case("not_found")]
    #[case("not_acceptable")]
    #[case("conflict")]
    #[case("service_unavailable")]
    #[case("internal_error")]
    fn error_code_schema_lists_every_code(#[case] code: &str) {
        assert_eq!(ErrorCodeSchema::name(), "crate.domain.ErrorCode");
        assert!(schema_to_json::<ErrorCodeSchema>().contains(code), "missing {code}");
    }
}
