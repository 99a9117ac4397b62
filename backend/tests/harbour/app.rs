//! Shared harness driving the full Harbour app over the in-memory store.

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::cookie::Key;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::test::{self, TestRequest};
use actix_web::web;
use harbour::domain::ports::FixtureIdentityVerifier;
use harbour::inbound::http::health::HealthState;
use harbour::inbound::http::state::{HttpState, PageLimits};
use harbour::outbound::memory::MemoryRecordStore;
use harbour::server::{AppDependencies, build_app, memory_ports};
use serde_json::Value;

/// Host every test request is addressed to.
pub const HOST: &str = "harbour.test";

pub async fn harbour_app_with(
    limits: PageLimits,
) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error> {
    let store = Arc::new(MemoryRecordStore::new());
    let ports = memory_ports(store, Arc::new(FixtureIdentityVerifier));
    let deps = AppDependencies {
        health_state: web::Data::new(HealthState::new()),
        http_state: web::Data::new(HttpState::new(ports, limits)),
        key: Key::generate(),
        cookie_secure: false,
    };
    test::init_service(build_app(deps)).await
}

pub async fn harbour_app()
-> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error> {
    harbour_app_with(PageLimits::default()).await
}

/// Request addressed to [`HOST`] under `/api/v1`.
pub fn api(method: actix_web::http::Method, path: &str) -> TestRequest {
    TestRequest::default()
        .method(method)
        .uri(&format!("/api/v1{path}"))
        .insert_header(("Host", HOST))
}

/// [`api`] with a fixture bearer token for `sub`.
pub fn as_user(method: actix_web::http::Method, path: &str, sub: &str) -> TestRequest {
    api(method, path).insert_header((AUTHORIZATION, format!("Bearer fixture.{sub}")))
}

/// Send `req` and return the status with the JSON body, or `Null` for an
/// empty body.
pub async fn send<S>(app: &S, req: TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

/// Create a boat owned by `sub` and return its id.
pub async fn create_boat<S>(app: &S, sub: &str, name: &str, public: bool) -> String
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let (status, body) = send(
        app,
        as_user(actix_web::http::Method::POST, "/boats", sub).set_json(serde_json::json!({
            "name": name,
            "type": "Catamaran",
            "length": 28,
            "public": public
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().expect("boat id").to_owned()
}

/// Create a load and return its id.
pub async fn create_load<S>(app: &S, sub: &str, content: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let (status, body) = send(
        app,
        as_user(actix_web::http::Method::POST, "/loads", sub).set_json(serde_json::json!({
            "volume": 5,
            "content": content,
            "creation_date": "2024-02-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().expect("load id").to_owned()
}
