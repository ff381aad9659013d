use axum::http::StatusCode;
use pena_shared::auth::{create_test_request, JwtSecret, TEST_JWT_SECRET};
use pena_shared::models::Role;
use pena_shared::store::{PushTokenStore, UserStore};
use pena_shared::test_utils::http_test_utils::response_to_json;
use serde_json::json;
use tower::ServiceExt;

use super::{create_test_app, ADMIN_ID, MEMBER_ID, STAFF_ID};
use crate::routes::create_router_with_store;

fn registration(dni: &str) -> serde_json::Value {
    json!({
        "firstName": " María ",
        "lastName": "García",
        "email": "Maria@Example.com",
        "dni": dni,
        "phone": "+34 612345678",
        "birthDate": "1995-03-14"
    })
}

#[tokio::test]
async fn test_register_user_creates_profile() {
    let (app, store) = create_test_app().await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/users/register",
            "new-user",
            Some(registration("12345678z")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let user = store.get_user("new-user").await.unwrap();
    assert_eq!(user.first_name, "María");
    assert_eq!(user.email, "maria@example.com");
    assert_eq!(user.dni, "12345678Z");
    assert_eq!(user.role, Role::User);
    assert!(!user.is_staff);
    assert!(user.preferences.notifications);
}

#[tokio::test]
async fn test_register_user_validates_dni() {
    let (app, store) = create_test_app().await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/users/register",
            "new-user",
            Some(registration("12345678A")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.get_user("new-user").await.is_err());
}

#[tokio::test]
async fn test_register_user_twice_conflicts() {
    let (app, _store) = create_test_app().await;

    let first = app
        .clone()
        .oneshot(create_test_request(
            "POST",
            "/users/register",
            "new-user",
            Some(registration("12345678Z")),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    // Same DNI from another account
    let second = app
        .oneshot(create_test_request(
            "POST",
            "/users/register",
            "another-user",
            Some(registration("12345678Z")),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unregistered_caller_is_forbidden() {
    let (app, _store) = create_test_app().await;

    let response = app
        .oneshot(create_test_request(
            "POST",
            "/crews",
            "ghost",
            Some(json!({ "title": "Fantasmas" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_to_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("registration"));
}

#[tokio::test]
async fn test_update_me_clears_phone() {
    let (app, store) = create_test_app().await;

    let response = app
        .oneshot(create_test_request(
            "PATCH",
            "/users/me",
            MEMBER_ID,
            Some(json!({ "phone": null, "preferences": { "newsletter": true } })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = store.get_user(MEMBER_ID).await.unwrap();
    assert_eq!(user.phone, None);
    assert!(user.preferences.newsletter);
}

#[tokio::test]
async fn test_role_changes_are_admin_only() {
    let (app, store) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &format!("/users/{}/role", MEMBER_ID),
            STAFF_ID,
            Some(json!({ "role": "admin" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PATCH",
            &format!("/users/{}/role", MEMBER_ID),
            ADMIN_ID,
            Some(json!({ "isStaff": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.get_user(MEMBER_ID).await.unwrap().is_staff);

    // Admins keep their own role
    let response = app
        .oneshot(create_test_request(
            "PATCH",
            &format!("/users/{}/role", ADMIN_ID),
            ADMIN_ID,
            Some(json!({ "role": "user" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.get_user(ADMIN_ID).await.unwrap().is_admin());
}

#[tokio::test]
async fn test_users_only_see_their_own_profile() {
    let (app, _store) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "GET",
            &format!("/users/{}", ADMIN_ID),
            MEMBER_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(create_test_request(
            "GET",
            &format!("/users/{}", MEMBER_ID),
            ADMIN_ID,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_staff_listing() {
    let (app, _store) = create_test_app().await;

    let response = app
        .oneshot(create_test_request("GET", "/staff", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_to_json(response).await;
    let staff = body["staff"].as_array().unwrap();
    assert_eq!(staff.len(), 1);
    assert_eq!(staff[0]["id"], STAFF_ID);
}

#[tokio::test]
async fn test_register_push_token() {
    let (app, store) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(create_test_request(
            "PUT",
            "/users/push-token",
            MEMBER_ID,
            Some(json!({ "pushToken": "not-expo", "platform": "ios" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(create_test_request(
            "PUT",
            "/users/push-token",
            MEMBER_ID,
            Some(json!({ "pushToken": "ExponentPushToken[abc123]", "platform": "android" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let tokens = store
        .get_push_tokens(&[MEMBER_ID.to_string()])
        .await
        .unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].platform, "android");
}

#[tokio::test]
async fn test_private_routes_use_the_configured_secret() {
    let (_app, store) = create_test_app().await;
    std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);

    let unconfigured = create_router_with_store(store.clone(), "", JwtSecret::new(None));
    let response = unconfigured
        .clone()
        .oneshot(create_test_request("GET", "/users/me", MEMBER_ID, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Public routes do not need a secret
    let response = unconfigured
        .oneshot(create_test_request("GET", "/staff", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let other_secret = create_router_with_store(
        store,
        "",
        JwtSecret::new(Some("another-secret".to_string())),
    );
    let response = other_secret
        .oneshot(create_test_request("GET", "/users/me", MEMBER_ID, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
