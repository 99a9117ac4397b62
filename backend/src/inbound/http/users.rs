//! Users API handlers.
//!
//! ```text
//! POST /api/v1/login {"idToken":"<google id token>"}
//! GET /api/v1/users
//! GET /api/v1/users/me
//! ```

use actix_web::{HttpRequest, get, post, web};
use pagination::{PageParams, Paginated};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{CREATION_DATE_FORMAT, Error, IdToken, IdTokenValidationError, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Authenticated;
use crate::inbound::http::links::Links;
use crate::inbound::http::paging::{envelope, page_request};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
///
/// Example JSON:
/// `{"idToken":"eyJhbGciOi..."}`
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub id_token: String,
}

impl TryFrom<LoginRequest> for IdToken {
    type Error = IdTokenValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_raw(&value.id_token)
    }
}

/// Public projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "1")]
    pub id: String,
    #[schema(example = "109876543210987654321")]
    pub sub: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "2024-02-01")]
    pub account_created: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            sub: user.sub.to_string(),
            first_name: user.first_name,
            last_name: user.last_name,
            account_created: user.account_created.format(CREATION_DATE_FORMAT).to_string(),
        }
    }
}

fn map_token_validation_error(err: IdTokenValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": "idToken" }))
}

/// Verify an identity token, onboard the user and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Token rejected", body = ErrorSchema),
        (status = 503, description = "Identity provider or record store unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let token = IdToken::try_from(payload.into_inner()).map_err(map_token_validation_error)?;
    let user = state.login.login(&token).await?;
    session.persist_subject(&user.sub)?;
    Ok(web::Json(user.into()))
}

/// List users.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use harbour::inbound::http::users::list_users;
///
/// let app = App::new().service(list_users);
/// ```
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(
        ("cursor" = Option<String>, Query, description = "Opaque cursor from a previous `next` link"),
        ("limit" = Option<u32>, Query, description = "Page size, at most 100")
    ),
    responses(
        (status = 200, description = "Page of users", body = UserPage),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Record store unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers",
    security([])
)]
#[get("/users")]
pub async fn list_users(
    req: HttpRequest,
    state: web::Data<HttpState>,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<UserResponse>>> {
    let request = page_request(&params, state.page_limits)?;
    let page = state.users.list(request).await?;
    let links = Links::from_request(&req);
    let body = envelope(&req, &links, request, page, |user| user.id.get(), UserResponse::from)?;
    Ok(web::Json(body))
}

/// The authenticated user.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Caller has never logged in", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    caller: Authenticated,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state.users.current(caller.principal()).await?;
    Ok(web::Json(user.into()))
}

/// OpenAPI shape of a page of users.
#[derive(ToSchema)]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct UserPage {
    data: Vec<UserResponse>,
    total: u64,
    next: Option<String>,
}
