//! Loads API handlers.
//!
//! ```text
//! POST   /api/v1/loads {"volume":5,"content":"LEGO Blocks","creation_date":"2024-02-01"}
//! GET    /api/v1/loads
//! GET    /api/v1/loads/{id}
//! PUT    /api/v1/loads/{id}
//! PATCH  /api/v1/loads/{id}
//! DELETE /api/v1/loads/{id}
//! ```
//!
//! `carrier` is read-only here; loads move between boats through the
//! assignment endpoints.

use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use pagination::{PageParams, Paginated};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{CREATION_DATE_FORMAT, Error, Load, LoadDraft, LoadPatch, LoadValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::boats::RecordLink;
use crate::inbound::http::extract::load_id;
use crate::inbound::http::links::Links;
use crate::inbound::http::paging::{envelope, page_request};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Create or replace body for a load.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoadRequest {
    #[schema(example = 5)]
    pub volume: i64,
    #[schema(example = "LEGO Blocks")]
    pub content: String,
    #[schema(example = "2024-02-01")]
    pub creation_date: String,
}

impl TryFrom<LoadRequest> for LoadDraft {
    type Error = LoadValidationError;

    fn try_from(value: LoadRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(value.volume, value.content, &value.creation_date)
    }
}

/// Partial update body for a load.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoadPatchRequest {
    pub volume: Option<i64>,
    pub content: Option<String>,
    pub creation_date: Option<String>,
}

impl TryFrom<LoadPatchRequest> for LoadPatch {
    type Error = LoadValidationError;

    fn try_from(value: LoadPatchRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(value.volume, value.content, value.creation_date.as_deref())
    }
}

/// Public projection of a load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct LoadResponse {
    #[schema(example = "9")]
    pub id: String,
    pub volume: u32,
    pub content: String,
    #[schema(example = "2024-02-01")]
    pub creation_date: String,
    /// Boat currently carrying the load, if any.
    pub carrier: Option<RecordLink>,
    #[serde(rename = "self")]
    pub self_link: String,
}

impl LoadResponse {
    /// Project a stored load.
    pub fn from_load(load: Load, links: &Links) -> Self {
        Self {
            id: load.id.to_string(),
            self_link: links.load(load.id),
            volume: load.volume,
            content: load.content,
            creation_date: load.creation_date.format(CREATION_DATE_FORMAT).to_string(),
            carrier: load.carrier.map(|boat| RecordLink {
                id: boat.to_string(),
                self_link: links.boat(boat),
            }),
        }
    }
}

fn map_load_validation_error(err: LoadValidationError) -> Error {
    let error = Error::invalid_request(err.to_string());
    match err.field() {
        Some(field) => error.with_details(json!({ "field": field })),
        None => error,
    }
}

/// Create a load. New loads are never on a boat.
#[utoipa::path(
    post,
    path = "/api/v1/loads",
    request_body = LoadRequest,
    responses(
        (status = 201, description = "Load created", body = LoadResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["loads"],
    operation_id = "createLoad"
)]
#[post("/loads")]
pub async fn create_load(
    req: HttpRequest,
    state: web::Data<HttpState>,
    caller: Authenticated,
    payload: web::Json<LoadRequest>,
) -> ApiResult<HttpResponse> {
    let draft = LoadDraft::try_from(payload.into_inner()).map_err(map_load_validation_error)?;
    let load = state.loads.create(caller.principal(), draft).await?;
    let body = LoadResponse::from_load(load, &Links::from_request(&req));
    Ok(HttpResponse::Created()
        .insert_header((LOCATION, body.self_link.clone()))
        .json(body))
}

/// List every load.
#[utoipa::path(
    get,
    path = "/api/v1/loads",
    params(
        ("cursor" = Option<String>, Query, description = "Opaque cursor from a previous `next` link"),
        ("limit" = Option<u32>, Query, description = "Page size, at most 100")
    ),
    responses(
        (status = 200, description = "Page of loads", body = LoadPage),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["loads"],
    operation_id = "listLoads",
    security([])
)]
#[get("/loads")]
pub async fn list_loads(
    req: HttpRequest,
    state: web::Data<HttpState>,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<LoadResponse>>> {
    let request = page_request(&params, state.page_limits)?;
    let page = state.loads_query.list(request).await?;
    let links = Links::from_request(&req);
    let body = envelope(&req, &links, request, page, |load| load.id.get(), |load| {
        LoadResponse::from_load(load, &links)
    })?;
    Ok(web::Json(body))
}

/// Fetch one load.
#[utoipa::path(
    get,
    path = "/api/v1/loads/{id}",
    params(("id" = String, Path, description = "Load id")),
    responses(
        (status = 200, description = "Load", body = LoadResponse),
        (status = 404, description = "Load not found", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["loads"],
    operation_id = "getLoad",
    security([])
)]
#[get("/loads/{id}")]
pub async fn get_load(
    req: HttpRequest,
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<LoadResponse>> {
    let id = load_id(&path)?;
    let load = state.loads_query.get(id).await?;
    Ok(web::Json(LoadResponse::from_load(
        load,
        &Links::from_request(&req),
    )))
}

/// Replace the descriptive fields of a load.
#[utoipa::path(
    put,
    path = "/api/v1/loads/{id}",
    params(("id" = String, Path, description = "Load id")),
    request_body = LoadRequest,
    responses(
        (status = 200, description = "Load replaced", body = LoadResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Load not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification", body = ErrorSchema)
    ),
    tags = ["loads"],
    operation_id = "replaceLoad"
)]
#[put("/loads/{id}")]
pub async fn replace_load(
    req: HttpRequest,
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<LoadRequest>,
) -> ApiResult<web::Json<LoadResponse>> {
    let id = load_id(&path)?;
    let draft = LoadDraft::try_from(payload.into_inner()).map_err(map_load_validation_error)?;
    let load = state.loads.replace(caller.principal(), id, draft).await?;
    Ok(web::Json(LoadResponse::from_load(
        load,
        &Links::from_request(&req),
    )))
}

/// Update some descriptive fields of a load.
#[utoipa::path(
    patch,
    path = "/api/v1/loads/{id}",
    params(("id" = String, Path, description = "Load id")),
    request_body = LoadPatchRequest,
    responses(
        (status = 200, description = "Load updated", body = LoadResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Load not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification", body = ErrorSchema)
    ),
    tags = ["loads"],
    operation_id = "patchLoad"
)]
#[patch("/loads/{id}")]
pub async fn patch_load(
    req: HttpRequest,
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
    payload: web::Json<LoadPatchRequest>,
) -> ApiResult<web::Json<LoadResponse>> {
    let id = load_id(&path)?;
    let patch = LoadPatch::try_from(payload.into_inner()).map_err(map_load_validation_error)?;
    let load = state.loads.patch(caller.principal(), id, patch).await?;
    Ok(web::Json(LoadResponse::from_load(
        load,
        &Links::from_request(&req),
    )))
}

/// Delete a load that is not on a boat.
#[utoipa::path(
    delete,
    path = "/api/v1/loads/{id}",
    params(("id" = String, Path, description = "Load id")),
    responses(
        (status = 204, description = "Load deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Load not found", body = ErrorSchema),
        (status = 409, description = "Load is on a boat", body = ErrorSchema)
    ),
    tags = ["loads"],
    operation_id = "deleteLoad"
)]
#[delete("/loads/{id}")]
pub async fn delete_load(
    state: web::Data<HttpState>,
    caller: Authenticated,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = load_id(&path)?;
    state.loads.delete(caller.principal(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// OpenAPI shape of a page of loads.
#[derive(ToSchema)]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct LoadPage {
    data: Vec<LoadResponse>,
    total: u64,
    next: Option<String>,
}
