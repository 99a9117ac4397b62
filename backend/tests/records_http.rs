//! Record endpoints, negotiation, sessions and listing over the full app.

#[path = "harbour/app.rs"]
mod harness;

use actix_web::http::header::{ACCEPT, SET_COOKIE};
use actix_web::http::{Method, StatusCode};
use actix_web::test::{self as actix_test, TestRequest};
use harbour::inbound::http::state::PageLimits;
use harness::{HOST, api, as_user, create_boat, create_load, harbour_app, harbour_app_with, send};
use rstest::rstest;
use serde_json::{Value, json};

fn ids(page: &Value) -> Vec<String> {
    page["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|item| item["id"].as_str().expect("id").to_owned())
        .collect()
}

#[actix_web::test]
async fn boat_listing_depends_on_the_caller() {
    let app = harbour_app().await;
    let alice_public = create_boat(&app, "alice", "Orca", true).await;
    let alice_private = create_boat(&app, "alice", "Narwhal", false).await;
    let bob_public = create_boat(&app, "bob", "Beluga", true).await;

    let (_, anonymous) = send(&app, api(Method::GET, "/boats")).await;
    assert_eq!(ids(&anonymous), [alice_public.clone(), bob_public]);

    let (_, alice) = send(&app, as_user(Method::GET, "/boats", "alice")).await;
    assert_eq!(ids(&alice), [alice_public, alice_private]);
    assert_eq!(alice["total"], 2);
    assert!(alice["data"][0].get("owner").is_none());
}

#[actix_web::test]
async fn private_boats_are_hidden_from_strangers() {
    let app = harbour_app().await;
    let boat = create_boat(&app, "alice", "Orca", false).await;
    let path = format!("/boats/{boat}");

    let (status, _) = send(&app, as_user(Method::GET, &path, "bob")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, api(Method::GET, &format!("{path}/loads"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn only_owners_change_boats() {
    let app = harbour_app().await;
    let boat = create_boat(&app, "alice", "Orca", true).await;
    let path = format!("/boats/{boat}");

    let (status, body) = send(
        &app,
        as_user(Method::PATCH, &path, "bob").set_json(json!({ "length": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = send(
        &app,
        as_user(Method::PATCH, &path, "alice").set_json(json!({ "length": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["length"], 30);
    assert_eq!(body["name"], "Orca");

    let (status, body) = send(
        &app,
        as_user(Method::PUT, &path, "alice").set_json(json!({
            "name": "Orca II", "type": "Sloop", "length": 12, "public": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Sloop");
    assert_eq!(body["public"], false);
}

#[actix_web::test]
async fn boat_names_are_unique() {
    let app = harbour_app().await;
    create_boat(&app, "alice", "Orca", true).await;
    let other = create_boat(&app, "bob", "Beluga", true).await;

    let (status, body) = send(
        &app,
        as_user(Method::POST, "/boats", "bob").set_json(json!({
            "name": "Orca", "type": "Sloop", "length": 12, "public": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["code"], "duplicate_name");

    let (status, _) = send(
        &app,
        as_user(Method::PATCH, &format!("/boats/{other}"), "bob").set_json(json!({ "name": "Orca" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        as_user(Method::PATCH, &format!("/boats/{other}"), "bob").set_json(json!({ "name": "Beluga" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "renaming a boat to its own name is allowed");
}

#[rstest]
#[case(Method::POST, "/boats", json!({ "name": "Orca", "type": "Sloop", "length": 12, "public": true, "owner": "bob" }))]
#[case(Method::POST, "/boats", json!({ "name": "Orca", "type": "Sloop", "length": 12 }))]
#[case(Method::POST, "/loads", json!({ "volume": 5, "content": "Crates", "creation_date": "2024-02-01", "carrier": "1" }))]
#[case(Method::POST, "/loads", json!({ "volume": -5, "content": "Crates", "creation_date": "2024-02-01" }))]
#[actix_web::test]
async fn malformed_bodies_are_invalid_requests(
    #[case] method: Method,
    #[case] path: &str,
    #[case] payload: Value,
) {
    let app = harbour_app().await;

    let (status, body) = send(&app, as_user(method, path, "alice").set_json(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[actix_web::test]
async fn empty_patches_are_rejected() {
    let app = harbour_app().await;
    let load = create_load(&app, "alice", "Crates").await;

    let (status, _) = send(
        &app,
        as_user(Method::PATCH, &format!("/loads/{load}"), "alice").set_json(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn clients_that_refuse_json_get_406() {
    let app = harbour_app().await;

    let (status, body) = send(&app, api(Method::GET, "/loads").insert_header((ACCEPT, "text/html"))).await;

    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["code"], "not_acceptable");
}

#[actix_web::test]
async fn listings_page_with_absolute_next_links() {
    let app = harbour_app_with(PageLimits { default: 3, max: 10 }).await;
    let mut created = Vec::new();
    for n in 0..7 {
        created.push(create_load(&app, "alice", &format!("crate {n}")).await);
    }

    let mut seen = Vec::new();
    let mut path = "/loads".to_owned();
    let mut pages = 0;
    loop {
        let (status, page) = send(&app, api(Method::GET, &path)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 7);
        seen.extend(ids(&page));
        pages += 1;
        let Some(next) = page["next"].as_str() else {
            break;
        };
        let prefix = format!("http://{HOST}/api/v1");
        assert!(next.starts_with(&prefix), "{next}");
        path = next.trim_start_matches(&prefix).to_owned();
    }

    assert_eq!(pages, 3);
    assert_eq!(seen, created);
}

#[rstest]
#[case("/loads?limit=0", 1)]
#[case("/loads?limit=500", 4)]
#[actix_web::test]
async fn page_sizes_are_clamped(#[case] path: &str, #[case] expected: usize) {
    let app = harbour_app_with(PageLimits { default: 2, max: 4 }).await;
    for n in 0..5 {
        create_load(&app, "alice", &format!("crate {n}")).await;
    }

    let (_, page) = send(&app, api(Method::GET, path)).await;

    assert_eq!(ids(&page).len(), expected);
}

#[actix_web::test]
async fn garbage_cursors_are_invalid_requests() {
    let app = harbour_app().await;

    let (status, body) = send(&app, api(Method::GET, "/boats?cursor=%21%21")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "cursor");
}

#[actix_web::test]
async fn session_login_authorises_later_requests() {
    let app = harbour_app().await;
    let res = actix_test::call_service(
        &app,
        api(Method::POST, "/login")
            .set_json(json!({ "idToken": "fixture.ada.Ada.Lovelace" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key(SET_COOKIE));
    let cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned();

    let (status, boat) = send(
        &app,
        api(Method::POST, "/boats")
            .cookie(cookie.clone())
            .set_json(json!({ "name": "Orca", "type": "Catamaran", "length": 28, "public": false })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, mine) = send(&app, api(Method::GET, "/boats").cookie(cookie.clone())).await;
    assert_eq!(ids(&mine), [boat["id"].as_str().expect("id").to_owned()]);
    let (_, me) = send(&app, api(Method::GET, "/users/me").cookie(cookie)).await;
    assert_eq!(me["first_name"], "Ada");
}

#[actix_web::test]
async fn forged_bearer_tokens_are_rejected_everywhere() {
    let app = harbour_app().await;

    let (status, _) = send(
        &app,
        api(Method::GET, "/boats").insert_header(("Authorization", "Bearer forged")),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn errors_carry_the_response_trace_id() {
    let app = harbour_app().await;

    let res = actix_test::call_service(&app, api(Method::GET, "/loads/77").to_request()).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let header = res
        .headers()
        .get("trace-id")
        .and_then(|value| value.to_str().ok())
        .expect("trace id header")
        .to_owned();
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["traceId"], json!(header));
}

#[actix_web::test]
async fn unknown_routes_answer_in_json() {
    let app = harbour_app().await;

    let (status, body) = send(&app, api(Method::GET, "/harbours")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[actix_web::test]
async fn health_probes_sit_outside_the_api() {
    let app = harbour_app().await;

    let res = actix_test::call_service(
        &app,
        TestRequest::get()
            .uri("/health/live")
            .insert_header((ACCEPT, "text/plain"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
}
