use std::sync::Arc;

use axum::{body::Body, Router};
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::repository::InMemoryAppointmentRepository;
use appointment_cell::router::appointment_routes;
use appointment_cell::services::booking::AppointmentBookingService;
use dental_service_cell::models::CreateServiceRequest;
use dental_service_cell::repository::InMemoryServiceRepository;
use dental_service_cell::services::catalog::CatalogService;
use dentist_cell::repository::InMemoryAvailabilityRepository;
use dentist_cell::services::availability::AvailabilityService;
use shared_models::auth::Actor;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    app: Router,
    config: TestConfig,
    service_id: Uuid,
}

async fn create_test_app() -> TestApp {
    let config = TestConfig::default();
    let catalog = Arc::new(CatalogService::new(Arc::new(InMemoryServiceRepository::new())));

    let cleaning = catalog.create_service(&Actor::Admin(Uuid::new_v4()), CreateServiceRequest {
        name: "Dental Cleaning".to_string(),
        description: None,
        price: 120.0,
        duration_minutes: 30,
    }).await.unwrap();

    let engine = Arc::new(AppointmentBookingService::new(
        Arc::new(InMemoryAppointmentRepository::new()),
        catalog,
        Arc::new(AvailabilityService::new(Arc::new(InMemoryAvailabilityRepository::new()))),
        config.booking_policy,
    ));

    TestApp {
        app: appointment_routes(config.to_arc(), engine),
        service_id: cleaning.id,
        config,
    }
}

fn book_request(token: &str, patient_id: Uuid, dentist_id: Uuid, service_id: Uuid, start: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({
            "patient_id": patient_id,
            "dentist_id": dentist_id,
            "service_id": service_id,
            "appointment_date": "2026-03-02",
            "start_time": start,
            "notes": null
        }).to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let test = create_test_app().await;

    let response = test.app
        .oneshot(book_request("", Uuid::new_v4(), Uuid::new_v4(), test.service_id, "09:00:00"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_then_overlap_returns_conflict_details() {
    let test = create_test_app().await;
    let patient = TestUser::patient("patient@toothslot.test");
    let token = JwtTestUtils::create_test_token(&patient, &test.config.jwt_secret, None);
    let dentist_id = Uuid::new_v4();

    let created = test.app.clone()
        .oneshot(book_request(&token, patient.id, dentist_id, test.service_id, "09:00:00"))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let body = body_json(created).await;
    assert_eq!(body["end_time"], "09:30:00");
    assert_eq!(body["status"], "pending");

    let clash = test.app
        .oneshot(book_request(&token, patient.id, dentist_id, test.service_id, "09:15:00"))
        .await
        .unwrap();
    assert_eq!(clash.status(), StatusCode::CONFLICT);

    let body = body_json(clash).await;
    assert_eq!(body["details"]["candidate"]["start_time"], "09:15:00");
    assert_eq!(body["details"]["conflicting_slot"]["start_time"], "09:00:00");
    assert_eq!(body["details"]["conflicting_slot"]["end_time"], "09:30:00");
}

#[tokio::test]
async fn test_cancel_by_another_patient_is_forbidden() {
    let test = create_test_app().await;
    let owner = TestUser::patient("owner@toothslot.test");
    let other = TestUser::patient("other@toothslot.test");
    let owner_token = JwtTestUtils::create_test_token(&owner, &test.config.jwt_secret, None);
    let other_token = JwtTestUtils::create_test_token(&other, &test.config.jwt_secret, None);

    let created = test.app.clone()
        .oneshot(book_request(&owner_token, owner.id, Uuid::new_v4(), test.service_id, "10:00:00"))
        .await
        .unwrap();
    let appointment_id = body_json(created).await["id"].as_str().unwrap().to_string();

    let cancel = |token: &str| Request::builder()
        .method("POST")
        .uri(format!("/{}/cancel", appointment_id))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let forbidden = test.app.clone().oneshot(cancel(&other_token)).await.unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let ok = test.app.oneshot(cancel(&owner_token)).await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(body_json(ok).await["appointment"]["status"], "cancelled");
}

#[tokio::test]
async fn test_dentist_status_update_and_invalid_transition() {
    let test = create_test_app().await;
    let patient = TestUser::patient("patient@toothslot.test");
    let dentist = TestUser::dentist("dentist@toothslot.test");
    let patient_token = JwtTestUtils::create_test_token(&patient, &test.config.jwt_secret, None);
    let dentist_token = JwtTestUtils::create_test_token(&dentist, &test.config.jwt_secret, None);

    let created = test.app.clone()
        .oneshot(book_request(&patient_token, patient.id, dentist.id, test.service_id, "11:00:00"))
        .await
        .unwrap();
    let appointment_id = body_json(created).await["id"].as_str().unwrap().to_string();

    let set_status = |status: &str| Request::builder()
        .method("PATCH")
        .uri(format!("/{}/status", appointment_id))
        .header("Authorization", format!("Bearer {}", dentist_token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "status": status }).to_string()))
        .unwrap();

    let skipped = test.app.clone().oneshot(set_status("completed")).await.unwrap();
    assert_eq!(skipped.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let confirmed = test.app.clone().oneshot(set_status("confirmed")).await.unwrap();
    assert_eq!(confirmed.status(), StatusCode::OK);
    assert_eq!(body_json(confirmed).await["status"], "confirmed");

    let schedule = test.app
        .oneshot(
            Request::builder()
                .uri(format!("/dentists/{}/schedule?date=2026-03-02", dentist.id))
                .header("Authorization", format!("Bearer {}", dentist_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(schedule.status(), StatusCode::OK);
    assert_eq!(body_json(schedule).await["appointments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_appointment_is_not_found() {
    let test = create_test_app().await;
    let admin = TestUser::admin("admin@toothslot.test");
    let token = JwtTestUtils::create_test_token(&admin, &test.config.jwt_secret, None);

    let response = test.app
        .oneshot(
            Request::builder()
                .uri(format!("/{}", Uuid::new_v4()))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slot_check_shows_only_occupied_intervals() {
    let test = create_test_app().await;
    let owner = TestUser::patient("owner@toothslot.test");
    let other = TestUser::patient("other@toothslot.test");
    let owner_token = JwtTestUtils::create_test_token(&owner, &test.config.jwt_secret, None);
    let other_token = JwtTestUtils::create_test_token(&other, &test.config.jwt_secret, None);
    let dentist_id = Uuid::new_v4();

    let created = test.app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("Authorization", format!("Bearer {}", owner_token))
                .header("Content-Type", "application/json")
                .body(Body::from(json!({
                    "patient_id": owner.id,
                    "dentist_id": dentist_id,
                    "service_id": test.service_id,
                    "appointment_date": "2026-03-02",
                    "start_time": "09:00:00",
                    "notes": "private medical note"
                }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let response = test.app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/slots/check?dentist_id={}&date=2026-03-02&start_time=09:00:00&end_time=09:30:00",
                    dentist_id
                ))
                .header("Authorization", format!("Bearer {}", other_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["has_conflict"], true);
    assert_eq!(body["conflicting_slots"].as_array().unwrap().len(), 1);
    assert_eq!(body["conflicting_slots"][0]["start_time"], "09:00:00");
    assert_eq!(body["conflicting_slots"][0]["end_time"], "09:30:00");

    let raw = body.to_string();
    assert!(!raw.contains("patient_id"));
    assert!(!raw.contains("notes"));
    assert!(!raw.contains("private medical note"));
    assert!(!raw.contains(&owner.id.to_string()));
}
