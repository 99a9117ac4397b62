//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer
//! - **Schemas**: request and response DTOs plus the domain error wrappers
//!   ([`ErrorSchema`], [`ErrorCodeSchema`])
//! - **Security**: session cookie and bearer ID token schemes
//!
//! The generated document is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::boats::{
    BoatPage, BoatPatchRequest, BoatRequest, BoatResponse, RecordLink,
};
use crate::inbound::http::loads::{LoadPage, LoadPatchRequest, LoadRequest, LoadResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::{LoginRequest, UserPage, UserResponse};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
        components.add_security_scheme(
            "BearerIdToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Google ID token verified on every request."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Harbour API",
        description = "Boats, loads and the assignments between them."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = []), ("BearerIdToken" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::current_user,
        crate::inbound::http::boats::create_boat,
        crate::inbound::http::boats::list_boats,
        crate::inbound::http::boats::get_boat,
        crate::inbound::http::boats::replace_boat,
        crate::inbound::http::boats::patch_boat,
        crate::inbound::http::boats::delete_boat,
        crate::inbound::http::boats::list_boat_loads,
        crate::inbound::http::assignments::assign_load,
        crate::inbound::http::assignments::unassign_load,
        crate::inbound::http::loads::create_load,
        crate::inbound::http::loads::list_loads,
        crate::inbound::http::loads::get_load,
        crate::inbound::http::loads::replace_load,
        crate::inbound::http::loads::patch_load,
        crate::inbound::http::loads::delete_load,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        UserResponse,
        UserPage,
        BoatRequest,
        BoatPatchRequest,
        BoatResponse,
        BoatPage,
        RecordLink,
        LoadRequest,
        LoadPatchRequest,
        LoadResponse,
        LoadPage,
    )),
    tags(
        (name = "users", description = "Login and user records"),
        (name = "boats", description = "Boats and their loads"),
        (name = "loads", description = "Loads"),
        (name = "assignments", description = "Putting loads on boats and taking them off"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
