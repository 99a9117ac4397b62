//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{HarbourSettings, SettingsError};
pub use state_builders::{
    PortRepositories, build_ports, diesel_ports, memory_ports, memory_ports_with,
};

use std::net::SocketAddr;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::Error;
use crate::inbound::http::accept::require_json;
use crate::inbound::http::assignments::{assign_load, unassign_load};
use crate::inbound::http::boats::{
    create_boat, delete_boat, get_boat, list_boat_loads, list_boats, patch_boat, replace_boat,
};
use crate::inbound::http::extract::{json_config, query_config};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::links::API_PREFIX;
use crate::inbound::http::loads::{
    create_load, delete_load, get_load, list_loads, patch_load, replace_load,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{current_user, list_users, login};

/// Everything one app instance needs. Cloned into each worker.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
    pub key: Key,
    pub cookie_secure: bool,
}

async fn unknown_route() -> Result<web::Json<()>, Error> {
    Err(Error::not_found("no such resource"))
}

/// Build the application: the `/api/v1` scope behind cookie sessions and
/// JSON negotiation, health probes, and Swagger UI in debug builds.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let api = web::scope(API_PREFIX)
        .wrap(session)
        .wrap(from_fn(require_json))
        .service(login)
        .service(list_users)
        .service(current_user)
        .service(create_boat)
        .service(list_boats)
        .service(get_boat)
        .service(replace_boat)
        .service(patch_boat)
        .service(delete_boat)
        .service(list_boat_loads)
        .service(assign_load)
        .service(unassign_load)
        .service(create_load)
        .service(list_loads)
        .service(get_load)
        .service(replace_load)
        .service(patch_load)
        .service(delete_load)
        .default_service(web::to(unknown_route));

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .app_data(query_config())
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server bound to `bind_addr`.
///
/// Readiness is marked once the socket is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket or starting the server fails.
pub fn create_server(deps: AppDependencies, bind_addr: SocketAddr) -> std::io::Result<Server> {
    let health_state = deps.health_state.clone();
    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(server)
}
