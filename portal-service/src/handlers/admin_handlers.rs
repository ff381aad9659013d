use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::Local;
use pena_shared::models::{CrewStatus, EventStatus};
use pena_shared::store::PortalStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::handlers::require_admin;
use crate::models::LogsQuery;

pub const DASHBOARD_UPCOMING_EVENTS: usize = 5;
pub const DASHBOARD_RECENT_LOGS: usize = 10;
pub const DEFAULT_LOG_LIMIT: usize = 50;
pub const MAX_LOG_LIMIT: usize = 500;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserCounts {
    total: usize,
    admins: usize,
    staff: usize,
}

// GET /admin/dashboard
pub async fn get_dashboard<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    let users = store.list_users().await?;
    let user_counts = UserCounts {
        total: users.len(),
        admins: users.iter().filter(|u| u.is_admin()).count(),
        staff: users.iter().filter(|u| u.is_staff).count(),
    };

    let crews = store.list_crews(None).await?;
    let mut crews_by_status: BTreeMap<String, usize> = CrewStatus::ALL
        .iter()
        .map(|status| (status.to_string(), 0))
        .collect();
    for crew in &crews {
        *crews_by_status.entry(crew.status.to_string()).or_default() += 1;
    }

    let pending_crews: Vec<_> = crews
        .iter()
        .filter(|c| c.status == CrewStatus::Pending)
        .collect();

    let now = Local::now().naive_local();
    let mut upcoming: Vec<_> = store
        .list_events()
        .await?
        .into_iter()
        .filter(|e| e.status == EventStatus::Active && e.starts_at() >= now)
        .collect();
    upcoming.sort_by_key(|e| e.starts_at());
    upcoming.truncate(DASHBOARD_UPCOMING_EVENTS);

    let recent_logs = store.recent_logs(DASHBOARD_RECENT_LOGS).await?;

    Ok(Json(serde_json::json!({
        "users": user_counts,
        "crewsByStatus": crews_by_status,
        "pendingCrews": pending_crews,
        "upcomingEvents": upcoming,
        "recentLogs": recent_logs,
    })))
}

// GET /admin/logs
pub async fn get_logs<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    let logs = store.recent_logs(limit).await?;

    Ok(Json(serde_json::json!({ "logs": logs, "limit": limit })))
}
