//! Tests for the boats handlers.

use super::*;
use crate::domain::{BoatId, BoatName, Load, Subject, Version};
use crate::inbound::http::extract::json_config;
use crate::inbound::http::test_utils::{memory_state, test_session_middleware};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::NaiveDate;
use rstest::rstest;
use serde_json::Value;

fn orca(loads: Vec<i64>) -> Boat {
    Boat {
        id: BoatId::new(1).expect("id"),
        version: Version::INITIAL,
        owner: Subject::new("alice").expect("sub"),
        name: BoatName::new("Orca").expect("name"),
        boat_type: "Catamaran".into(),
        length: 28,
        public: true,
        loads: loads.into_iter().filter_map(LoadId::new).collect(),
    }
}

#[rstest]
fn projection_hides_the_owner() {
    let links = Links::for_origin("https://harbour.test");

    let body = serde_json::to_value(BoatResponse::from_boat(orca(vec![9]), &links))
        .expect("serialise");

    assert_eq!(
        body,
        json!({
            "id": "1",
            "name": "Orca",
            "type": "Catamaran",
            "length": 28,
            "public": true,
            "loads": [{ "id": "9", "self": "https://harbour.test/api/v1/loads/9" }],
            "self": "https://harbour.test/api/v1/boats/1"
        })
    );
}

#[rstest]
fn hydrated_projection_lists_only_verified_loads() {
    let links = Links::for_origin("https://harbour.test");
    let verified = Load {
        id: LoadId::new(9).expect("id"),
        version: Version::INITIAL,
        volume: 5,
        content: "LEGO Blocks".into(),
        creation_date: NaiveDate::from_ymd_opt(2024, 2, 1).expect("date"),
        carrier: BoatId::new(1),
    };
    let hydrated = HydratedBoat {
        boat: orca(vec![9, 12]),
        loads: vec![verified],
    };

    let body = BoatResponse::from_hydrated(hydrated, &links);

    assert_eq!(body.loads.len(), 1);
    assert_eq!(body.loads[0].id, "9");
}

#[rstest]
#[case(json!({ "name": "", "type": "Catamaran", "length": 28, "public": true }), "name")]
#[case(json!({ "name": "Orca", "type": "Catamaran", "length": 0, "public": true }), "length")]
#[case(json!({ "name": "Orca", "type": " ", "length": 28, "public": true }), "type")]
fn validation_errors_name_the_field(#[case] raw: Value, #[case] field: &str) {
    let request: BoatRequest = serde_json::from_value(raw).expect("shape");

    let error = BoatDraft::try_from(request)
        .map_err(map_boat_validation_error)
        .expect_err("invalid");

    assert_eq!(error.details(), Some(&json!({ "field": field })));
}

#[rstest]
fn public_flag_accepts_the_camel_case_alias() {
    let raw = json!({ "name": "Orca", "type": "Catamaran", "length": 28, "isPublic": false });
    let request: BoatRequest = serde_json::from_value(raw).expect("alias");
    assert!(!request.public);
}

#[actix_web::test]
async fn create_then_fetch_round_trips_through_the_app() {
    let app = actix_test::init_service(
        App::new()
            .app_data(memory_state())
            .app_data(json_config())
            .wrap(test_session_middleware())
            .service(create_boat)
            .service(get_boat)
            .service(delete_boat),
    )
    .await;

    let created = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/boats")
            .insert_header(("Authorization", "Bearer fixture.alice"))
            .set_json(json!({ "name": "Orca", "type": "Catamaran", "length": 28, "public": false }))
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(created).await;
    let id = body["id"].as_str().expect("id").to_owned();
    assert_eq!(body["loads"], json!([]));
    assert!(body.get("owner").is_none());

    let anonymous = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri(&format!("/boats/{id}")).to_request(),
    )
    .await;
    assert_eq!(anonymous.status(), StatusCode::NOT_FOUND);

    let stranger = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/boats/{id}"))
            .insert_header(("Authorization", "Bearer fixture.mallory"))
            .to_request(),
    )
    .await;
    assert_eq!(
        stranger.status(),
        StatusCode::NOT_FOUND,
        "a private boat stays invisible to strangers, even on delete"
    );

    let owner = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/boats/{id}"))
            .insert_header(("Authorization", "Bearer fixture.alice"))
            .to_request(),
    )
    .await;
    assert_eq!(owner.status(), StatusCode::OK);
}

#[actix_web::test]
async fn create_requires_a_principal() {
    let app = actix_test::init_service(
        App::new()
            .app_data(memory_state())
            .app_data(json_config())
            .wrap(test_session_middleware())
            .service(create_boat),
    )
    .await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/boats")
            .set_json(json!({ "name": "Orca", "type": "Catamaran", "length": 28, "public": true }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_ids_read_as_missing_boats() {
    let app = actix_test::init_service(
        App::new()
            .app_data(memory_state())
            .wrap(test_session_middleware())
            .service(get_boat),
    )
    .await;

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/boats/orca").to_request())
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["missing"], json!(["boat"]));
}
