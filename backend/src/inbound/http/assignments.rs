//! Assignment API handlers: put a load on a boat or take it off.
//!
//! ```text
//! PUT    /api/v1/boats/{boat_id}/loads/{load_id}
//! DELETE /api/v1/boats/{boat_id}/loads/{load_id}
//! ```

use actix_web::{HttpResponse, delete, put, web};

use crate::domain::{BoatId, LoadId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Parse both path ids. A malformed id names no record, so the engine
/// reports it as missing together with the other side.
fn pair(path: &(String, String)) -> (Option<BoatId>, Option<LoadId>) {
    (path.0.parse().ok(), path.1.parse().ok())
}

/// Assign a load to a boat.
#[utoipa::path(
    put,
    path = "/api/v1/boats/{boat_id}/loads/{load_id}",
    params(
        ("boat_id" = String, Path, description = "Boat id"),
        ("load_id" = String, Path, description = "Load id")
    ),
    responses(
        (status = 204, description = "Load assigned"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Boat or load not found; details.missing names which", body = ErrorSchema),
        (status = 409, description = "Load already assigned or concurrent modification", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["assignments"],
    operation_id = "assignLoad"
)]
#[put("/boats/{boat_id}/loads/{load_id}")]
pub async fn assign_load(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (boat, load) = pair(&path);
    state
        .assignments
        .assign(caller.principal(), boat, load)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Remove a load from the boat carrying it.
#[utoipa::path(
    delete,
    path = "/api/v1/boats/{boat_id}/loads/{load_id}",
    params(
        ("boat_id" = String, Path, description = "Boat id"),
        ("load_id" = String, Path, description = "Load id")
    ),
    responses(
        (status = 204, description = "Load removed"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Boat or load not found; details.missing names which", body = ErrorSchema),
        (status = 409, description = "Load is not on this boat or concurrent modification", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["assignments"],
    operation_id = "unassignLoad"
)]
#[delete("/boats/{boat_id}/loads/{load_id}")]
pub async fn unassign_load(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (boat, load) = pair(&path);
    state
        .assignments
        .unassign(caller.principal(), boat, load)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
