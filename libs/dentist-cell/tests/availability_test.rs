use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dentist_cell::models::{AvailabilityError, CreateAvailabilityRequest};
use dentist_cell::repository::{
    AvailabilityRepository, InMemoryAvailabilityRepository, SupabaseAvailabilityRepository,
};
use dentist_cell::services::availability::AvailabilityService;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::Actor;
use shared_utils::test_utils::MockSupabaseResponses;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// 2026-02-16 is a Monday.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 16).unwrap()
}

fn service() -> AvailabilityService {
    AvailabilityService::new(Arc::new(InMemoryAvailabilityRepository::new()))
}

fn weekday_window(day: i32, start: NaiveTime, end: NaiveTime) -> CreateAvailabilityRequest {
    CreateAvailabilityRequest { day_of_week: day, start_time: start, end_time: end }
}

#[tokio::test]
async fn test_dentist_can_publish_weekly_window() {
    let service = service();
    let dentist_id = Uuid::new_v4();
    let dentist = Actor::Dentist(dentist_id);

    let created = service
        .set_availability(&dentist, dentist_id, weekday_window(1, t(9, 0), t(17, 0)))
        .await
        .unwrap();

    assert!(created.is_available);
    assert_eq!(created.dentist_id, dentist_id);

    assert!(service.is_within_availability(dentist_id, monday(), t(9, 0), t(9, 30)).await.unwrap());
    assert!(!service.is_within_availability(dentist_id, monday(), t(16, 45), t(17, 15)).await.unwrap());
    // Tuesday has no window.
    let tuesday = monday().succ_opt().unwrap();
    assert!(!service.is_within_availability(dentist_id, tuesday, t(10, 0), t(10, 30)).await.unwrap());
}

#[tokio::test]
async fn test_other_dentist_cannot_edit_schedule() {
    let service = service();
    let dentist_id = Uuid::new_v4();

    let result = service
        .set_availability(&Actor::Dentist(Uuid::new_v4()), dentist_id, weekday_window(1, t(9, 0), t(12, 0)))
        .await;
    assert_matches!(result, Err(AvailabilityError::Forbidden));

    let result = service
        .set_availability(&Actor::Patient(dentist_id), dentist_id, weekday_window(1, t(9, 0), t(12, 0)))
        .await;
    assert_matches!(result, Err(AvailabilityError::Forbidden));

    let result = service
        .set_availability(&Actor::Admin(Uuid::new_v4()), dentist_id, weekday_window(1, t(9, 0), t(12, 0)))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_invalid_windows_are_rejected() {
    let service = service();
    let dentist_id = Uuid::new_v4();
    let dentist = Actor::Dentist(dentist_id);

    let result = service.set_availability(&dentist, dentist_id, weekday_window(7, t(9, 0), t(12, 0))).await;
    assert_matches!(result, Err(AvailabilityError::ValidationError(_)));

    let result = service.set_availability(&dentist, dentist_id, weekday_window(2, t(12, 0), t(12, 0))).await;
    assert_matches!(result, Err(AvailabilityError::ValidationError(_)));
}

#[tokio::test]
async fn test_overlapping_window_same_day_conflicts() {
    let service = service();
    let dentist_id = Uuid::new_v4();
    let dentist = Actor::Dentist(dentist_id);

    let first = service
        .set_availability(&dentist, dentist_id, weekday_window(3, t(9, 0), t(12, 0)))
        .await
        .unwrap();

    let result = service.set_availability(&dentist, dentist_id, weekday_window(3, t(11, 0), t(14, 0))).await;
    assert_matches!(result, Err(AvailabilityError::Overlap { existing_id, .. }) if existing_id == first.id);

    // Adjacent windows and other days are fine.
    assert!(service.set_availability(&dentist, dentist_id, weekday_window(3, t(12, 0), t(14, 0))).await.is_ok());
    assert!(service.set_availability(&dentist, dentist_id, weekday_window(4, t(11, 0), t(14, 0))).await.is_ok());
}

#[tokio::test]
async fn test_removed_window_is_kept_but_no_longer_counts() {
    let service = service();
    let dentist_id = Uuid::new_v4();
    let dentist = Actor::Dentist(dentist_id);

    let window = service
        .set_availability(&dentist, dentist_id, weekday_window(1, t(9, 0), t(17, 0)))
        .await
        .unwrap();

    let removed = service.remove_availability(&dentist, window.id).await.unwrap();
    assert!(!removed.is_available);
    assert!(removed.updated_at.is_some());

    let listed = service.list_availability(dentist_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(!service.is_within_availability(dentist_id, monday(), t(9, 0), t(9, 30)).await.unwrap());

    // The slot can be republished once the old one is disabled.
    assert!(service.set_availability(&dentist, dentist_id, weekday_window(1, t(9, 0), t(12, 0))).await.is_ok());

    let missing = service.remove_availability(&dentist, Uuid::new_v4()).await;
    assert_matches!(missing, Err(AvailabilityError::NotFound));
}

#[tokio::test]
async fn test_supabase_repository_lists_dentist_windows() {
    let mock_server = MockServer::start().await;
    let dentist_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/dentist_availabilities"))
        .and(query_param("dentist_id", format!("eq.{}", dentist_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::availability_response(dentist_id, 1, "09:00:00", "12:00:00"),
            MockSupabaseResponses::availability_response(dentist_id, 1, "13:00:00", "17:00:00"),
        ])))
        .mount(&mock_server)
        .await;

    let client = Arc::new(SupabaseClient::with_base_url(&mock_server.uri(), "test-anon-key"));
    let repository = SupabaseAvailabilityRepository::new(client);

    let windows = repository.list_for_dentist(dentist_id).await.unwrap();
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[1].start_time, t(13, 0));

    let service = AvailabilityService::new(Arc::new(repository));
    assert!(service.is_within_availability(dentist_id, monday(), t(13, 0), t(14, 30)).await.unwrap());
    assert!(!service.is_within_availability(dentist_id, monday(), t(11, 30), t(13, 30)).await.unwrap());
}

#[tokio::test]
async fn test_supabase_repository_surfaces_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/dentist_availabilities"))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockSupabaseResponses::error_response("boom", "XX000"),
        ))
        .mount(&mock_server)
        .await;

    let client = Arc::new(SupabaseClient::with_base_url(&mock_server.uri(), "test-anon-key"));
    let repository = SupabaseAvailabilityRepository::new(client);

    let result = repository.list_for_dentist(Uuid::new_v4()).await;
    assert_matches!(result, Err(AvailabilityError::DatabaseError(_)));
}
