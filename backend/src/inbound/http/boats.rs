//! Boats API handlers.
//!
//! ```text
//! POST   /api/v1/boats {"name":"Orca","type":"Catamaran","length":28,"public":true}
//! GET    /api/v1/boats
//! GET    /api/v1/boats/{id}
//! PUT    /api/v1/boats/{id}
//! PATCH  /api/v1/boats/{id}
//! DELETE /api/v1/boats/{id}
//! GET    /api/v1/boats/{id}/loads
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use pagination::{PageParams, Paginated};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    Boat, BoatDraft, BoatPatch, BoatValidationError, Error, HydratedBoat, LoadId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{Authenticated, MaybeAuthenticated};
use crate::inbound::http::extract::boat_id;
use crate::inbound::http::links::Links;
use crate::inbound::http::loads::LoadResponse;
use crate::inbound::http::paging::{envelope, page_request};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Create or replace body for a boat. Every field is required.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BoatRequest {
    #[schema(example = "Orca")]
    pub name: String,
    #[serde(rename = "type")]
    #[schema(example = "Catamaran")]
    pub boat_type: String,
    #[schema(example = 28)]
    pub length: i64,
    #[serde(alias = "isPublic")]
    pub public: bool,
}

impl TryFrom<BoatRequest> for BoatDraft {
    type Error = BoatValidationError;

    fn try_from(value: BoatRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(value.name, value.boat_type, value.length, value.public)
    }
}

/// Partial update body for a boat. At least one field is required.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BoatPatchRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub boat_type: Option<String>,
    pub length: Option<i64>,
    #[serde(alias = "isPublic")]
    pub public: Option<bool>,
}

impl TryFrom<BoatPatchRequest> for BoatPatch {
    type Error = BoatValidationError;

    fn try_from(value: BoatPatchRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(value.name, value.boat_type, value.length, value.public)
    }
}

/// Reference to another record: its id and `self` link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct RecordLink {
    #[schema(example = "9")]
    pub id: String,
    #[serde(rename = "self")]
    #[schema(example = "https://harbour.test/api/v1/loads/9")]
    pub self_link: String,
}

/// Public projection of a boat. The owner is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct BoatResponse {
    #[schema(example = "1")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub boat_type: String,
    pub length: u32,
    pub public: bool,
    pub loads: Vec<RecordLink>,
    #[serde(rename = "self")]
    pub self_link: String,
}

impl BoatResponse {
    fn project(boat: Boat, loads: impl IntoIterator<Item = LoadId>, links: &Links) -> Self {
        let loads = loads
            .into_iter()
            .map(|id| RecordLink {
                id: id.to_string(),
                self_link: links.load(id),
            })
            .collect();
        Self {
            id: boat.id.to_string(),
            self_link: links.boat(boat.id),
            name: boat.name.to_string(),
            boat_type: boat.boat_type,
            length: boat.length,
            public: boat.public,
            loads,
        }
    }

    /// Project a stored boat, listing its load references as stored.
    pub fn from_boat(mut boat: Boat, links: &Links) -> Self {
        let loads = std::mem::take(&mut boat.loads);
        Self::project(boat, loads, links)
    }

    /// Project a hydrated boat, listing only verified loads.
    pub fn from_hydrated(hydrated: HydratedBoat, links: &Links) -> Self {
        let HydratedBoat { boat, loads } = hydrated;
        Self::project(boat, loads.iter().map(|load| load.id), links)
    }
}

pub(crate) fn map_boat_validation_error(err: BoatValidationError) -> Error {
    let error = Error::invalid_request(err.to_string());
    match err.field() {
        Some(field) => error.with_details(json!({ "field": field })),
        None => error,
    }
}

/// Create a boat owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/boats",
    request_body = BoatRequest,
    responses(
        (status = 201, description = "Boat created", body = BoatResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Boat name already in use", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["boats"],
    operation_id = "createBoat"
)]
#[post("/boats")]
pub async fn create_boat(
    req: HttpRequest,
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<BoatRequest>,
) -> ApiResult<HttpResponse> {
    let draft = BoatDraft::try_from(payload.into_inner()).map_err(map_boat_validation_error)?;
    let boat = state.boats.create(caller.principal(), draft).await?;
    let links = Links::from_request(&req);
    let body = BoatResponse::from_boat(boat, &links);
    Ok(HttpResponse::Created()
        .insert_header((actix_web::http::header::LOCATION, body.self_link.clone()))
        .json(body))
}

/// List the caller's boats, or public boats for anonymous callers.
#[utoipa::path(
    get,
    path = "/api/v1/boats",
    params(
        ("cursor" = Option<String>, Query, description = "Opaque cursor from a previous `next` link"),
        ("limit" = Option<u32>, Query, description = "Page size, at most 100")
    ),
    responses(
        (status = 200, description = "Page of boats", body = BoatPage),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["boats"],
    operation_id = "listBoats",
    security([])
)]
#[get("/boats")]
pub async fn list_boats(
    req: HttpRequest,
    state: web::Data<HttpState>,
    caller: MaybeAuthenticated,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<BoatResponse>>> {
    let request = page_request(&params, state.page_limits)?;
    let page = state.boats_query.list(caller.principal(), request).await?;
    let links = Links::from_request(&req);
    let body = envelope(&req, &links, request, page, |boat| boat.id.get(), |boat| {
        BoatResponse::from_boat(boat, &links)
    })?;
    Ok(web::Json(body))
}

/// Fetch a visible boat with its verified loads.
#[utoipa::path(
    get,
    path = "/api/v1/boats/{id}",
    params(("id" = String, Path, description = "Boat id")),
    responses(
        (status = 200, description = "Boat", body = BoatResponse),
        (status = 404, description = "Boat not found or not visible", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["boats"],
    operation_id = "getBoat",
    security([])
)]
#[get("/boats/{id}")]
pub async fn get_boat(
    req: HttpRequest,
    state: web::Data<HttpState>,
    caller: MaybeAuthenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<BoatResponse>> {
    let id = boat_id(&path)?;
    let hydrated = state.boats_query.fetch(caller.principal(), id).await?;
    Ok(web::Json(BoatResponse::from_hydrated(
        hydrated,
        &Links::from_request(&req),
    )))
}

/// Replace every descriptive field of an owned boat.
#[utoipa::path(
    put,
    path = "/api/v1/boats/{id}",
    params(("id" = String, Path, description = "Boat id")),
    request_body = BoatRequest,
    responses(
        (status = 200, description = "Boat replaced", body = BoatResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Boat not found", body = ErrorSchema),
        (status = 409, description = "Name in use or concurrent modification", body = ErrorSchema)
    ),
    tags = ["boats"],
    operation_id = "replaceBoat"
)]
#[put("/boats/{id}")]
pub async fn replace_boat(
    req: HttpRequest,
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<BoatRequest>,
) -> ApiResult<web::Json<BoatResponse>> {
    let id = boat_id(&path)?;
    let draft = BoatDraft::try_from(payload.into_inner()).map_err(map_boat_validation_error)?;
    let boat = state.boats.replace(caller.principal(), id, draft).await?;
    Ok(web::Json(BoatResponse::from_boat(
        boat,
        &Links::from_request(&req),
    )))
}

/// Update some descriptive fields of an owned boat.
#[utoipa::path(
    patch,
    path = "/api/v1/boats/{id}",
    params(("id" = String, Path, description = "Boat id")),
    request_body = BoatPatchRequest,
    responses(
        (status = 200, description = "Boat updated", body = BoatResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Boat not found", body = ErrorSchema),
        (status = 409, description = "Name in use or concurrent modification", body = ErrorSchema)
    ),
    tags = ["boats"],
    operation_id = "patchBoat"
)]
#[patch("/boats/{id}")]
pub async fn patch_boat(
    req: HttpRequest,
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<BoatPatchRequest>,
) -> ApiResult<web::Json<BoatResponse>> {
    let id = boat_id(&path)?;
    let patch = BoatPatch::try_from(payload.into_inner()).map_err(map_boat_validation_error)?;
    let boat = state.boats.patch(caller.principal(), id, patch).await?;
    Ok(web::Json(BoatResponse::from_boat(
        boat,
        &Links::from_request(&req),
    )))
}

/// Delete an owned boat that carries no loads.
#[utoipa::path(
    delete,
    path = "/api/v1/boats/{id}",
    params(("id" = String, Path, description = "Boat id")),
    responses(
        (status = 204, description = "Boat deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Boat not found", body = ErrorSchema),
        (status = 409, description = "Boat still carries loads", body = ErrorSchema)
    ),
    tags = ["boats"],
    operation_id = "deleteBoat"
)]
#[delete("/boats/{id}")]
pub async fn delete_boat(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = boat_id(&path)?;
    state.boats.delete(caller.principal(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// List the loads on a visible boat.
#[utoipa::path(
    get,
    path = "/api/v1/boats/{id}/loads",
    params(("id" = String, Path, description = "Boat id")),
    responses(
        (status = 200, description = "Loads on the boat", body = [LoadResponse]),
        (status = 404, description = "Boat not found or not visible", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["boats"],
    operation_id = "listBoatLoads",
    security([])
)]
#[get("/boats/{id}/loads")]
pub async fn list_boat_loads(
    req: HttpRequest,
    state: web::Data<HttpState>,
    caller: MaybeAuthenticated,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<LoadResponse>>> {
    let id = boat_id(&path)?;
    let loads = state.boats_query.loads_on_boat(caller.principal(), id).await?;
    let links = Links::from_request(&req);
    Ok(web::Json(
        loads
            .into_iter()
            .map(|load| LoadResponse::from_load(load, &links))
            .collect(),
    ))
}

/// OpenAPI shape of a page of boats.
#[derive(ToSchema)]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct BoatPage {
    data: Vec<BoatResponse>,
    total: u64,
    next: Option<String>,
}

#[cfg(test)]
#[path = "boats_tests.rs"]
mod tests;
