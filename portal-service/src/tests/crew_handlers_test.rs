use axum::http::StatusCode;
use pena_shared::auth::create_test_request;
use pena_shared::models::{now_str, CrewStatus, GameStatus, Message, MessageType};
use pena_shared::store::{ActionLogStore, CrewStore, MessageStore};
use pena_shared::test_utils::http_test_utils::response_to_json;
use serde_json::json;
use tower::ServiceExt;

use super::{create_test_app, seed_game, ADMIN_ID, MEMBER_ID, OTHER_MEMBER_ID};
use crate::handlers::crew_handlers::MAX_COPIED_GAMES;

async fn register_crew(app: &axum::Router, title: &str, responsable: Vec<&str>) -> String {
    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/crews",
            MEMBER_ID,
            Some(json!({
                "title": title,
                "responsable": responsable,
                "membersNames": ["Ana", "Luis"]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_to_json(response).await;
    body["crew"]["id"].as_str().unwrap().to_string()
}

fn rejection(crew_id: &str, id: &str) -> Message {
    let now = now_str();
    Message {
        id: id.to_string(),
        crew_id: crew_id.to_string(),
        message_type: MessageType::Rechazo,
        text: "Falta documentación".to_string(),
        created_at: now.clone(),
        updated_at: now,
    }
}

#[tokio::test]
async fn test_register_crew_starts_pending() {
    let (app, store) = create_test_app().await;

    let crew_id = register_crew(&app, "Los Bravos", vec![MEMBER_ID, OTHER_MEMBER_ID]).await;

    let crew = store.get_crew(&crew_id).await.unwrap();
    assert_eq!(crew.status, CrewStatus::Pending);
    assert_eq!(crew.slug, "los-bravos");
    assert_eq!(crew.responsable.len(), 2);
    assert_eq!(crew.members_names, vec!["Ana", "Luis"]);

    let logs = store.recent_logs(10).await.unwrap();
    assert!(logs.iter().any(|l| l.action == "register_crew"));
}

#[tokio::test]
async fn test_register_crew_defaults_responsable_to_caller() {
    let (app, store) = create_test_app().await;

    let crew_id = register_crew(&app, "La Charanga", vec![]).await;
    let crew = store.get_crew(&crew_id).await.unwrap();
    assert_eq!(crew.responsable, vec![MEMBER_ID.to_string()]);
}

#[tokio::test]
async fn test_register_crew_rejects_too_many_responsables() {
    let (app, _store) = create_test_app().await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/crews",
            MEMBER_ID,
            Some(json!({
                "title": "Demasiados",
                "responsable": [MEMBER_ID, OTHER_MEMBER_ID, ADMIN_ID]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_crew_rejects_duplicate_slug() {
    let (app, _store) = create_test_app().await;
    register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/crews",
            MEMBER_ID,
            Some(json!({ "title": "los  bravos" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_crew_requires_authentication() {
    let (app, _store) = create_test_app().await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/crews",
            "",
            Some(json!({ "title": "Anónimos" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_approve_crew_copies_active_games_and_clears_rejections() {
    let (app, store) = create_test_app().await;

    seed_game(&store, "Tiro de soga", GameStatus::Active).await;
    seed_game(&store, "Carrera de sacos", GameStatus::Active).await;
    seed_game(&store, "Concurso de paellas", GameStatus::Finished).await;

    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;
    store
        .create_message(rejection(&crew_id, "old-rejection"))
        .await
        .unwrap();
    let mut notice = rejection(&crew_id, "notice");
    notice.message_type = MessageType::Aviso;
    store.create_message(notice).await.unwrap();

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/approve", crew_id),
            ADMIN_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_to_json(response).await;
    assert_eq!(body["crew"]["status"], "Activo");
    assert_eq!(body["gamesCopied"], 2);
    assert_eq!(body["rejectionMessagesRemoved"], 1);

    let games = store.list_crew_games(&crew_id).await.unwrap();
    assert_eq!(games.len(), 2);
    assert!(games.iter().all(|g| !g.participated && g.points == 0));

    let messages = store.list_messages(&crew_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_type, MessageType::Aviso);

    // Active crews are visible on the public listing
    let response = app
        .oneshot(create_test_request("GET", "/crews/by-slug/los-bravos", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_approve_crew_caps_copied_games() {
    let (app, store) = create_test_app().await;

    for i in 0..(MAX_COPIED_GAMES + 5) {
        seed_game(&store, &format!("Juego {}", i), GameStatus::Active).await;
    }
    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/approve", crew_id),
            ADMIN_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let games = store.list_crew_games(&crew_id).await.unwrap();
    assert_eq!(games.len(), MAX_COPIED_GAMES);
}

#[tokio::test]
async fn test_approve_non_pending_crew_conflicts_without_changes() {
    let (app, store) = create_test_app().await;
    seed_game(&store, "Tiro de soga", GameStatus::Active).await;

    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/reject", crew_id),
            ADMIN_ID,
            Some(json!({ "reason": "Nombre ofensivo" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let before = store.get_crew(&crew_id).await.unwrap();
    let logs_before = store.recent_logs(100).await.unwrap().len();

    let response = app
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/approve", crew_id),
            ADMIN_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let after = store.get_crew(&crew_id).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after.status, CrewStatus::Rejected);
    assert!(store.list_crew_games(&crew_id).await.unwrap().is_empty());
    assert_eq!(store.recent_logs(100).await.unwrap().len(), logs_before);
}

#[tokio::test]
async fn test_reject_crew_requires_reason() {
    let (app, store) = create_test_app().await;
    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/reject", crew_id),
            ADMIN_ID,
            Some(json!({ "reason": "   " })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let crew = store.get_crew(&crew_id).await.unwrap();
    assert_eq!(crew.status, CrewStatus::Pending);
    assert_eq!(crew.version, 0);
    assert!(store.list_messages(&crew_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reject_crew_stores_reason_message() {
    let (app, store) = create_test_app().await;
    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/reject", crew_id),
            ADMIN_ID,
            Some(json!({ "reason": "Nombre duplicado" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let messages = store
        .list_messages_of_type(&crew_id, MessageType::Rechazo)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Nombre duplicado");

    // The responsable can read why
    let response = app
        .oneshot(create_test_request(
            "GET",
            &format!("/crews/{}/messages", crew_id),
            MEMBER_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_admin_can_approve() {
    let (app, store) = create_test_app().await;
    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/approve", crew_id),
            MEMBER_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        store.get_crew(&crew_id).await.unwrap().status,
        CrewStatus::Pending
    );
}

#[tokio::test]
async fn test_concurrent_approvals_have_one_winner() {
    let (app, store) = create_test_app().await;
    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;
    let uri = format!("/admin/crews/{}/approve", crew_id);

    let (first, second) = tokio::join!(
        app.clone()
            .oneshot(create_test_request("POST", &uri, ADMIN_ID, None)),
        app.clone()
            .oneshot(create_test_request("POST", &uri, ADMIN_ID, None)),
    );

    let mut statuses = vec![first.unwrap().status(), second.unwrap().status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);

    let crew = store.get_crew(&crew_id).await.unwrap();
    assert_eq!(crew.status, CrewStatus::Active);
    assert_eq!(crew.version, 1);
}

#[tokio::test]
async fn test_withdraw_only_while_pending() {
    let (app, store) = create_test_app().await;
    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "DELETE",
            &format!("/crews/{}", crew_id),
            MEMBER_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        store.get_crew(&crew_id).await.unwrap().status,
        CrewStatus::Deleted
    );

    let response = app
        .oneshot(create_test_request(
            "DELETE",
            &format!("/crews/{}", crew_id),
            MEMBER_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_modify_crew_checks_version_and_ownership() {
    let (app, store) = create_test_app().await;
    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &format!("/crews/{}", crew_id),
            OTHER_MEMBER_ID,
            Some(json!({ "membersNames": ["Intruso"] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &format!("/crews/{}", crew_id),
            MEMBER_ID,
            Some(json!({ "membersNames": ["Ana", "Luis", "Marta"], "version": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(create_test_request(
            "PATCH",
            &format!("/crews/{}", crew_id),
            MEMBER_ID,
            Some(json!({ "membersNames": ["Ana"], "version": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let crew = store.get_crew(&crew_id).await.unwrap();
    assert_eq!(crew.members_names, vec!["Ana", "Luis", "Marta"]);
}

#[tokio::test]
async fn test_admin_crew_listing_filters_by_status() {
    let (app, _store) = create_test_app().await;
    register_crew(&app, "Los Bravos", vec![]).await;
    let second = register_crew(&app, "La Charanga", vec![]).await;

    app.clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/approve", second),
            ADMIN_ID,
            None,
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(create_test_request(
            "GET",
            "/admin/crews?status=pendiente",
            ADMIN_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    let crews = body["crews"].as_array().unwrap();
    assert_eq!(crews.len(), 1);
    assert_eq!(crews[0]["title"], "Los Bravos");

    let response = app
        .oneshot(create_test_request(
            "GET",
            "/admin/crews?status=nope",
            ADMIN_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_record_results_updates_ranking() {
    let (app, store) = create_test_app().await;
    let game = seed_game(&store, "Tiro de soga", GameStatus::Active).await;

    let bravos = register_crew(&app, "Los Bravos", vec![]).await;
    let charanga = register_crew(&app, "La Charanga", vec![]).await;
    for id in [&bravos, &charanga] {
        let response = app
            .clone()
            .oneshot(create_test_request(
                "POST",
                &format!("/admin/crews/{}/approve", id),
                ADMIN_ID,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &format!("/admin/crews/{}/games/{}", charanga, game.id),
            ADMIN_ID,
            Some(json!({ "participated": true, "points": 7 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(create_test_request("GET", "/ranking", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    let ranking = body["ranking"].as_array().unwrap();
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0]["title"], "La Charanga");
    assert_eq!(ranking[0]["points"], 7);
    assert_eq!(ranking[0]["position"], 1);
    assert_eq!(ranking[1]["position"], 2);
}

#[tokio::test]
async fn test_rejected_crew_can_no_longer_be_modified() {
    let (app, store) = create_test_app().await;
    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/reject", crew_id),
            ADMIN_ID,
            Some(json!({ "reason": "Nombre duplicado" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let before = store.get_crew(&crew_id).await.unwrap();

    let response = app
        .oneshot(create_test_request(
            "PATCH",
            &format!("/crews/{}", crew_id),
            MEMBER_ID,
            Some(json!({ "membersNames": ["Ana", "Luis", "Marta"] })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let after = store.get_crew(&crew_id).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after.status, CrewStatus::Rejected);
}

#[tokio::test]
async fn test_crew_games_are_public_only_once_approved() {
    let (app, _store) = create_test_app().await;
    let crew_id = register_crew(&app, "Los Bravos", vec![]).await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "GET",
            &format!("/crews/{}/games", crew_id),
            "",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            &format!("/admin/crews/{}/approve", crew_id),
            ADMIN_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(create_test_request(
            "GET",
            &format!("/crews/{}/games", crew_id),
            "",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    assert_eq!(body["crewId"], crew_id.as_str());
}
