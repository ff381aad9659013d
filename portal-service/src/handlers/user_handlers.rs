use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use log::info;
use pena_shared::models::user::{is_valid_dni, is_valid_email, is_valid_phone};
use pena_shared::models::{now_str, PushToken, Role, User};
use pena_shared::store::PortalStore;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::handlers::{load_caller, record_action, require_admin};
use crate::models::{
    RegisterPushTokenRequest, RegisterUserRequest, StaffMember, UpdateProfileRequest,
    UpdateRoleRequest,
};

fn validate_name(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn validate_phone(phone: Option<String>) -> Result<Option<String>> {
    match phone.map(|p| p.trim().to_string()) {
        Some(p) if p.is_empty() => Ok(None),
        Some(p) if !is_valid_phone(&p) => Err(AppError::bad_request(format!(
            "Invalid phone number: {}",
            p
        ))),
        other => Ok(other),
    }
}

// POST /users/register
// Creates the profile of the signed-in identity
pub async fn register_user<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)>
where
    S: PortalStore,
{
    let first_name = validate_name("First name", &payload.first_name)?;
    let last_name = validate_name("Last name", &payload.last_name)?;

    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::bad_request(format!("Invalid email: {}", email)));
    }

    let dni = payload.dni.trim().to_uppercase();
    if !is_valid_dni(&dni) {
        return Err(AppError::bad_request(format!("Invalid DNI/NIE: {}", dni)));
    }

    if payload.birth_date > Local::now().date_naive() {
        return Err(AppError::bad_request("Birth date cannot be in the future"));
    }

    let phone = validate_phone(payload.phone)?;

    let users = store.list_users().await?;
    if users.iter().any(|u| u.id == user_id) {
        return Err(AppError::conflict("This account is already registered"));
    }
    if users.iter().any(|u| u.dni == dni) {
        return Err(AppError::conflict("A user with this DNI is already registered"));
    }

    let now = now_str();
    let user = User {
        id: user_id.clone(),
        first_name,
        last_name,
        email,
        dni,
        phone,
        birth_date: payload.birth_date,
        role: Role::User,
        is_staff: false,
        preferences: payload.preferences.unwrap_or_default(),
        created_at: now.clone(),
        updated_at: now,
    };

    let created = store.create_user(user).await?;
    info!("Registered profile for user {}", user_id);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "user": created })),
    ))
}

// GET /users/me
pub async fn get_me<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let user = store.get_user(&user_id).await?;
    Ok(Json(serde_json::json!({ "user": user })))
}

// PATCH /users/me
pub async fn update_me<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let mut user = store.get_user(&user_id).await?;

    if let Some(first_name) = payload.first_name {
        user.first_name = validate_name("First name", &first_name)?;
    }
    if let Some(last_name) = payload.last_name {
        user.last_name = validate_name("Last name", &last_name)?;
    }
    if let Some(phone) = payload.phone {
        user.phone = validate_phone(phone.into_option())?;
    }
    if let Some(preferences) = payload.preferences {
        user.preferences = preferences;
    }

    let updated = store.update_user(user).await?;
    Ok(Json(serde_json::json!({ "user": updated })))
}

// GET /users
pub async fn list_users<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;
    let users = store.list_users().await?;
    Ok(Json(serde_json::json!({ "users": users })))
}

// GET /users/:id
pub async fn get_user<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    if id != user_id {
        require_admin(&*store, &user_id).await?;
    }
    let user = store.get_user(&id).await?;
    Ok(Json(serde_json::json!({ "user": user })))
}

// PATCH /users/:id/role
pub async fn update_user_role<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    if id == user_id && payload.role == Some(Role::User) {
        return Err(AppError::bad_request(
            "Administrators cannot remove their own admin role",
        ));
    }

    let mut user = store.get_user(&id).await?;
    if let Some(role) = payload.role {
        user.role = role;
    }
    if let Some(is_staff) = payload.is_staff {
        user.is_staff = is_staff;
    }

    let updated = store.update_user(user).await?;

    record_action(
        &*store,
        &user_id,
        "update_user_role",
        serde_json::json!({
            "targetUserId": updated.id,
            "role": updated.role,
            "isStaff": updated.is_staff,
        }),
    )
    .await;

    Ok(Json(serde_json::json!({ "user": updated })))
}

// GET /staff
pub async fn list_staff<S>(State(store): State<Arc<S>>) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let staff: Vec<StaffMember> = store
        .list_users()
        .await?
        .iter()
        .filter(|u| u.is_staff)
        .map(StaffMember::from)
        .collect();

    Ok(Json(serde_json::json!({ "staff": staff })))
}

// PUT /users/push-token
// Register or update a user's push notification token
pub async fn register_push_token<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Json(request): Json<RegisterPushTokenRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    info!(
        "Registering push token for user: {}, platform: {}",
        user_id, request.platform
    );

    load_caller(&*store, &user_id).await?;

    if request.platform != "ios" && request.platform != "android" {
        return Err(AppError::bad_request(format!(
            "Invalid platform: {}. Must be 'ios' or 'android'",
            request.platform
        )));
    }

    // Expo push tokens look like "ExponentPushToken[...]"
    if !request.push_token.starts_with("ExponentPushToken[") {
        return Err(AppError::bad_request(
            "Invalid push token format. Expected Expo push token.",
        ));
    }

    store
        .save_push_token(PushToken {
            user_id: user_id.clone(),
            push_token: request.push_token,
            platform: request.platform,
            updated_at: now_str(),
        })
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Push token registered successfully"
    })))
}
