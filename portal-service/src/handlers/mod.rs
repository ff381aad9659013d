use log::{error, info};
use pena_shared::models::{ActionLog, User};
use pena_shared::store::{ActionLogStore, StoreError, UserStore};

use crate::error::{AppError, Result};
use crate::models::Page;

pub mod admin_handlers;
pub mod chat_handlers;
pub mod crew_handlers;
pub mod event_handlers;
pub mod gallery_handlers;
pub mod game_handlers;
pub mod user_handlers;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// Loads the caller's profile. A signed-in user without a profile has not
/// finished registration and may not act yet.
pub async fn load_caller<S>(store: &S, user_id: &str) -> Result<User>
where
    S: UserStore + ?Sized,
{
    match store.get_user(user_id).await {
        Ok(user) => Ok(user),
        Err(StoreError::NotFound(_)) => Err(AppError::forbidden(
            "Complete your registration before using this feature",
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn require_admin<S>(store: &S, user_id: &str) -> Result<User>
where
    S: UserStore + ?Sized,
{
    let user = load_caller(store, user_id).await?;
    if !user.is_admin() {
        return Err(AppError::forbidden("This action requires an administrator"));
    }
    Ok(user)
}

pub async fn require_staff<S>(store: &S, user_id: &str) -> Result<User>
where
    S: UserStore + ?Sized,
{
    let user = load_caller(store, user_id).await?;
    if !user.is_staff_or_admin() {
        return Err(AppError::forbidden("This action requires staff permissions"));
    }
    Ok(user)
}

/// Appends an audit record. Failures are logged and otherwise ignored so
/// the mutation that triggered the log still succeeds.
pub async fn record_action<S>(store: &S, user_id: &str, action: &str, details: serde_json::Value)
where
    S: ActionLogStore + ?Sized,
{
    let log = ActionLog::new(user_id, action, details);
    match store.append_log(log).await {
        Ok(()) => info!("Recorded action {} by {}", action, user_id),
        Err(e) => error!("Failed to record action {} by {}: {}", action, user_id, e),
    }
}

/// Slices `items` according to `limit`/`offset`, clamping the page size.
pub fn paginate<T>(items: Vec<T>, limit: Option<usize>, offset: Option<usize>) -> Page<T> {
    let total = items.len();
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0);
    let items = items.into_iter().skip(offset).take(limit).collect();

    Page {
        items,
        total,
        limit,
        offset,
    }
}

/// Trims every entry and drops the empty ones.
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
