use axum::http::StatusCode;
use chrono::{Datelike, Duration, Local};
use pena_shared::auth::create_test_request;
use pena_shared::models::{EventStatus, Role};
use pena_shared::store::EventStore;
use pena_shared::test_utils::http_test_utils::response_to_json;
use serde_json::json;
use tower::ServiceExt;

use super::{create_test_app, seed_event, seed_user, ADMIN_ID, MEMBER_ID, OTHER_MEMBER_ID, STAFF_ID};

#[tokio::test]
async fn test_search_matches_title_description_and_location() {
    let (app, store) = create_test_app().await;

    seed_event(&store, "Summer Fest", "Conciertos", "Plaza", 3).await;
    seed_event(&store, "Cena popular", "Gran FESTIVAL gastronómico", "Frontón", 4).await;
    seed_event(&store, "Misa", "Procesión", "Calle Festival", 5).await;
    seed_event(&store, "Torneo de mus", "Campeonato", "Bar Central", 6).await;

    let response = app
        .oneshot(create_test_request("GET", "/events?search=fest", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_to_json(response).await;
    assert_eq!(body["total"], 3);
    let mut titles: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Cena popular", "Misa", "Summer Fest"]);
}

#[tokio::test]
async fn test_list_events_paginates() {
    let (app, store) = create_test_app().await;
    for day in 1..=5 {
        seed_event(&store, &format!("Evento {}", day), "", "Plaza", day).await;
    }

    let response = app
        .oneshot(create_test_request("GET", "/events?limit=2&offset=4", "", None))
        .await
        .unwrap();
    let body = response_to_json(response).await;
    assert_eq!(body["total"], 5);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["events"].as_array().unwrap().len(), 1);
    assert_eq!(body["events"][0]["title"], "Evento 5");
}

#[tokio::test]
async fn test_get_event_by_slug_reports_remaining_places() {
    let (app, store) = create_test_app().await;
    seed_event(&store, "Verbena de agosto", "", "Plaza", 2).await;

    let response = app
        .oneshot(create_test_request("GET", "/events/by-slug/verbena-de-agosto", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    assert_eq!(body["event"]["title"], "Verbena de agosto");
    assert_eq!(body["event"]["remainingPlaces"], 2);
}

#[tokio::test]
async fn test_create_event_requires_staff() {
    let (app, store) = create_test_app().await;
    let date = (Local::now().date_naive() + Duration::days(7)).to_string();
    let payload = json!({
        "title": "Verbena",
        "startDate": date,
        "startTime": "20:00:00",
        "endDate": date,
        "endTime": "23:30:00",
        "location": "Plaza",
        "capacity": 100
    });

    let response = app
        .clone()
        .oneshot(create_test_request("POST", "/events", MEMBER_ID, Some(payload.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(create_test_request("POST", "/events", STAFF_ID, Some(payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_to_json(response).await;
    assert_eq!(body["event"]["slug"], "verbena");
    assert_eq!(body["event"]["status"], "Activo");
    assert_eq!(body["event"]["organizer"], STAFF_ID);

    assert_eq!(store.list_events().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_event_rejects_end_before_start() {
    let (app, _store) = create_test_app().await;
    let date = (Local::now().date_naive() + Duration::days(7)).to_string();

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/events",
            ADMIN_ID,
            Some(json!({
                "title": "Al revés",
                "startDate": date,
                "startTime": "20:00:00",
                "endDate": date,
                "endTime": "19:00:00",
                "capacity": 10
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_join_event_until_full() {
    let (app, store) = create_test_app().await;
    let event = seed_event(&store, "Cena", "", "Frontón", 3).await;
    seed_user(&store, "member-3", Role::User, false).await;
    let uri = format!("/events/{}/participants", event.id);

    for user in [MEMBER_ID, OTHER_MEMBER_ID] {
        let response = app
            .clone()
            .oneshot(create_test_request("POST", &uri, user, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(create_test_request("POST", &uri, "member-3", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(create_test_request("DELETE", &uri, MEMBER_ID, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(create_test_request("POST", &uri, "member-3", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = store.get_event(&event.id).await.unwrap();
    assert_eq!(stored.participants, vec![OTHER_MEMBER_ID, "member-3"]);
}

#[tokio::test]
async fn test_leave_event_frees_the_place() {
    let (app, store) = create_test_app().await;
    let event = seed_event(&store, "Cena", "", "Frontón", 3).await;
    let uri = format!("/events/{}/participants", event.id);

    let response = app
        .clone()
        .oneshot(create_test_request("POST", &uri, MEMBER_ID, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(create_test_request("DELETE", &uri, MEMBER_ID, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    assert!(body["event"]["participants"].as_array().unwrap().is_empty());
    assert_eq!(body["event"]["remainingPlaces"], 2);

    let stored = store.get_event(&event.id).await.unwrap();
    assert!(stored.participants.is_empty());

    // Leaving again has nothing to undo
    let response = app
        .oneshot(create_test_request("DELETE", &uri, MEMBER_ID, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_event_twice_is_refused() {
    let (app, store) = create_test_app().await;
    let event = seed_event(&store, "Cena", "", "Frontón", 3).await;
    let uri = format!("/events/{}/participants", event.id);

    let first = app
        .clone()
        .oneshot(create_test_request("POST", &uri, MEMBER_ID, None))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(create_test_request("POST", &uri, MEMBER_ID, None))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_event_rejects_stale_version() {
    let (app, store) = create_test_app().await;
    let event = seed_event(&store, "Cena", "", "Frontón", 3).await;
    let uri = format!("/events/{}", event.id);

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &uri,
            STAFF_ID,
            Some(json!({ "status": "Cancelado", "version": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(create_test_request(
            "PATCH",
            &uri,
            STAFF_ID,
            Some(json!({ "capacity": 50, "version": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let stored = store.get_event(&event.id).await.unwrap();
    assert_eq!(stored.status, EventStatus::Cancelled);
    assert_eq!(stored.capacity, 2);
}

#[tokio::test]
async fn test_calendar_places_events_on_their_days() {
    let (app, store) = create_test_app().await;
    let event = seed_event(&store, "Cena", "", "Frontón", 1).await;
    let date = event.start_date;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "GET",
            &format!("/calendar?year={}&month={}", date.year(), date.month()),
            "",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    let days = body["days"].as_array().unwrap();
    let day = days
        .iter()
        .find(|d| d["date"] == date.to_string())
        .unwrap();
    assert_eq!(day["events"][0]["title"], "Cena");

    let response = app
        .oneshot(create_test_request("GET", "/calendar?year=2026&month=13", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
