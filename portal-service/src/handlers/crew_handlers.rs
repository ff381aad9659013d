use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use log::{error, info, warn};
use pena_shared::models::events::{CREW_APPROVED, CREW_REJECTED};
use pena_shared::models::{
    now_str, slugify, Crew, CrewGame, CrewStatus, GameStatus, Message, MessageType,
    MAX_RESPONSABLES,
};
use pena_shared::store::{PortalStore, StoreError, UserStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::handlers::{clean_list, load_caller, record_action, require_admin};
use crate::models::{
    CreateCrewRequest, CrewGameUpdateRequest, CrewListQuery, PublicCrew, RejectCrewRequest,
    UpdateCrewRequest,
};
use crate::notifications::{crew_status_event, publish_crew_status_event};

/// Upper bound on games copied into a newly approved crew.
pub const MAX_COPIED_GAMES: usize = 100;

/// Validates a responsable list: 1..=MAX_RESPONSABLES distinct registered users.
async fn validate_responsables<S>(store: &S, responsable: &[String]) -> Result<()>
where
    S: UserStore + ?Sized,
{
    if responsable.is_empty() {
        return Err(AppError::bad_request("A crew needs at least one responsable"));
    }
    if responsable.len() > MAX_RESPONSABLES {
        return Err(AppError::bad_request(format!(
            "A crew can have at most {} responsables",
            MAX_RESPONSABLES
        )));
    }
    if responsable.len() == 2 && responsable[0] == responsable[1] {
        return Err(AppError::bad_request("Responsables must be different users"));
    }

    for user_id in responsable {
        match store.get_user(user_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => {
                return Err(AppError::bad_request(format!(
                    "Responsable {} is not a registered user",
                    user_id
                )))
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Fails with 409 if another live crew already uses `slug`.
async fn ensure_slug_free<S>(store: &S, slug: &str, own_id: Option<&str>) -> Result<()>
where
    S: PortalStore + ?Sized,
{
    match store.get_crew_by_slug(slug).await {
        Ok(existing) if Some(existing.id.as_str()) != own_id => Err(AppError::conflict(format!(
            "A crew named like '{}' already exists",
            existing.title
        ))),
        Ok(_) | Err(StoreError::NotFound(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn load_crew_for_member<S>(store: &S, crew_id: &str, user_id: &str) -> Result<Crew>
where
    S: PortalStore + ?Sized,
{
    let crew = store.get_crew(crew_id).await?;
    if crew.is_responsable(user_id) {
        return Ok(crew);
    }
    let caller = load_caller(store, user_id).await?;
    if caller.is_admin() {
        return Ok(crew);
    }
    Err(AppError::forbidden(
        "Only the crew's responsables or an administrator can do this",
    ))
}

/// Runs the guarded status transition, turning a stale status into a 409.
async fn transition<S>(
    store: &S,
    crew_id: &str,
    next: CrewStatus,
    message: Option<Message>,
) -> Result<Crew>
where
    S: PortalStore + ?Sized,
{
    let expected = CrewStatus::Pending;
    if !expected.can_transition_to(next) {
        return Err(AppError::conflict(format!(
            "A {} crew cannot be moved to {}",
            expected, next
        )));
    }

    match store
        .transition_crew_status(crew_id, expected, next, message)
        .await
    {
        Ok(crew) => Ok(crew),
        Err(StoreError::ConditionFailed(detail)) => {
            warn!("Stale status transition to {} refused: {}", next, detail);
            Err(AppError::conflict(format!(
                "The crew is no longer pending and cannot be moved to {}",
                next
            )))
        }
        Err(e) => Err(e.into()),
    }
}

// POST /crews
pub async fn register_crew<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CreateCrewRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)>
where
    S: PortalStore,
{
    load_caller(&*store, &user_id).await?;

    let title = payload.title.trim().to_string();
    let slug = slugify(&title);
    if slug.is_empty() {
        return Err(AppError::bad_request("The crew needs a title"));
    }

    let responsable = if payload.responsable.is_empty() {
        vec![user_id.clone()]
    } else {
        clean_list(payload.responsable)
    };
    validate_responsables(&*store, &responsable).await?;
    ensure_slug_free(&*store, &slug, None).await?;

    let now = now_str();
    let crew = Crew {
        id: Uuid::new_v4().to_string(),
        slug,
        title,
        responsable,
        members_names: clean_list(payload.members_names),
        status: CrewStatus::Pending,
        created_by: user_id.clone(),
        created_at: now.clone(),
        updated_at: now,
        version: 0,
    };

    let created = store.create_crew(crew).await?;
    info!("Crew {} registered by {}", created.id, user_id);

    record_action(
        &*store,
        &user_id,
        "register_crew",
        serde_json::json!({ "crewId": created.id, "title": created.title }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "crew": created })),
    ))
}

// GET /crews
pub async fn list_active_crews<S>(
    State(store): State<Arc<S>>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let crews: Vec<PublicCrew> = store
        .list_crews(Some(CrewStatus::Active))
        .await?
        .into_iter()
        .map(PublicCrew::from)
        .collect();

    Ok(Json(serde_json::json!({ "crews": crews })))
}

// GET /crews/by-slug/:slug
pub async fn get_crew_by_slug<S>(
    State(store): State<Arc<S>>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let crew = store.get_crew_by_slug(&slug).await?;
    if crew.status != CrewStatus::Active {
        return Err(AppError::not_found(format!("Crew with slug {} not found", slug)));
    }
    Ok(Json(serde_json::json!({ "crew": PublicCrew::from(crew) })))
}

// GET /crews/:id/games
pub async fn get_crew_games<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let crew = store.get_crew(&id).await?;
    if crew.status != CrewStatus::Active {
        return Err(AppError::not_found(format!("Crew {} not found", id)));
    }
    let games = store.list_crew_games(&crew.id).await?;
    Ok(Json(serde_json::json!({ "crewId": crew.id, "games": games })))
}

// GET /crews/mine
pub async fn get_my_crews<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let crews: Vec<Crew> = store
        .list_crews(None)
        .await?
        .into_iter()
        .filter(|c| c.status != CrewStatus::Deleted && c.is_responsable(&user_id))
        .collect();

    Ok(Json(serde_json::json!({ "crews": crews })))
}

// GET /crews/:id
pub async fn get_crew<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let crew = load_crew_for_member(&*store, &id, &user_id).await?;
    Ok(Json(serde_json::json!({ "crew": crew })))
}

// PATCH /crews/:id
pub async fn modify_crew<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateCrewRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let mut crew = load_crew_for_member(&*store, &id, &user_id).await?;

    if matches!(crew.status, CrewStatus::Rejected | CrewStatus::Deleted) {
        return Err(AppError::bad_request(format!(
            "A crew in status {} can no longer be modified",
            crew.status
        )));
    }

    if let Some(version) = payload.version {
        if version != crew.version {
            return Err(AppError::conflict(
                "The crew was changed by someone else, reload and try again",
            ));
        }
    }

    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        let slug = slugify(&title);
        if slug.is_empty() {
            return Err(AppError::bad_request("The crew needs a title"));
        }
        if slug != crew.slug {
            ensure_slug_free(&*store, &slug, Some(&crew.id)).await?;
        }
        crew.title = title;
        crew.slug = slug;
    }

    if let Some(responsable) = payload.responsable {
        let responsable = clean_list(responsable);
        validate_responsables(&*store, &responsable).await?;
        crew.responsable = responsable;
    }

    if let Some(members_names) = payload.members_names {
        crew.members_names = clean_list(members_names);
    }

    let updated = store.update_crew(crew).await?;

    record_action(
        &*store,
        &user_id,
        "modify_crew",
        serde_json::json!({ "crewId": updated.id, "title": updated.title }),
    )
    .await;

    Ok(Json(serde_json::json!({ "crew": updated })))
}

// DELETE /crews/:id
pub async fn withdraw_crew<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    load_crew_for_member(&*store, &id, &user_id).await?;

    let crew = transition(&*store, &id, CrewStatus::Deleted, None).await?;

    record_action(
        &*store,
        &user_id,
        "withdraw_crew",
        serde_json::json!({ "crewId": crew.id, "title": crew.title }),
    )
    .await;

    Ok(Json(serde_json::json!({
        "message": "Crew withdrawn",
        "crew": crew
    })))
}

// GET /crews/:id/messages
pub async fn get_crew_messages<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let crew = load_crew_for_member(&*store, &id, &user_id).await?;
    let messages = store.list_messages(&crew.id).await?;
    Ok(Json(serde_json::json!({ "messages": messages })))
}

// GET /admin/crews
pub async fn list_crews_admin<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Query(query): Query<CrewListQuery>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    let status = match query.status.as_deref() {
        Some(raw) => Some(raw.parse::<CrewStatus>().map_err(AppError::bad_request)?),
        None => None,
    };

    let crews = store.list_crews(status).await?;
    Ok(Json(serde_json::json!({ "crews": crews })))
}

/// What the best-effort part of an approval managed to do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalReport {
    pub games_copied: usize,
    pub rejections_removed: usize,
}

/// Post-approval work. Every step is independent; failures are logged and
/// never undo the approval.
pub async fn run_approval_side_effects<S>(store: &S, crew: &Crew, admin_id: &str) -> ApprovalReport
where
    S: PortalStore + ?Sized,
{
    let mut report = ApprovalReport::default();

    match store.list_games().await {
        Ok(games) => {
            let now = now_str();
            let entries: Vec<CrewGame> = games
                .into_iter()
                .filter(|g| g.status == GameStatus::Active)
                .take(MAX_COPIED_GAMES)
                .map(|g| CrewGame {
                    crew_id: crew.id.clone(),
                    game_id: g.id,
                    name: g.name,
                    date: g.date,
                    season: g.season,
                    participated: false,
                    points: 0,
                    updated_at: now.clone(),
                })
                .collect();
            let count = entries.len();

            if count > 0 {
                match store.put_crew_games(entries).await {
                    Ok(()) => report.games_copied = count,
                    Err(e) => error!("Failed to copy games into crew {}: {}", crew.id, e),
                }
            }
        }
        Err(e) => error!("Failed to load active games for crew {}: {}", crew.id, e),
    }

    match store
        .list_messages_of_type(&crew.id, MessageType::Rechazo)
        .await
    {
        Ok(rejections) if !rejections.is_empty() => {
            let ids: Vec<String> = rejections.into_iter().map(|m| m.id).collect();
            match store.delete_messages(&ids).await {
                Ok(()) => report.rejections_removed = ids.len(),
                Err(e) => error!(
                    "Failed to delete rejection messages of crew {}: {}",
                    crew.id, e
                ),
            }
        }
        Ok(_) => {}
        Err(e) => error!(
            "Failed to load rejection messages of crew {}: {}",
            crew.id, e
        ),
    }

    record_action(
        store,
        admin_id,
        "approve_crew",
        serde_json::json!({
            "crewId": crew.id,
            "title": crew.title,
            "gamesCopied": report.games_copied,
            "rejectionsRemoved": report.rejections_removed,
        }),
    )
    .await;

    report
}

// POST /admin/crews/:id/approve
pub async fn approve_crew<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    let crew = transition(&*store, &id, CrewStatus::Active, None).await?;
    info!("Crew {} approved by {}", crew.id, user_id);

    let report = run_approval_side_effects(&*store, &crew, &user_id).await;

    // Fire and forget
    if let Err(e) = publish_crew_status_event(&crew_status_event(CREW_APPROVED, &crew, None)).await
    {
        error!("Failed to publish crew_approved event: {:?}", e);
    }

    Ok(Json(serde_json::json!({
        "crew": crew,
        "gamesCopied": report.games_copied,
        "rejectionMessagesRemoved": report.rejections_removed,
    })))
}

// POST /admin/crews/:id/reject
pub async fn reject_crew<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<RejectCrewRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    let reason = payload.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::bad_request("A rejection needs a reason"));
    }

    let now = now_str();
    let message = Message {
        id: Uuid::new_v4().to_string(),
        crew_id: id.clone(),
        message_type: MessageType::Rechazo,
        text: reason.clone(),
        created_at: now.clone(),
        updated_at: now,
    };

    let crew = transition(&*store, &id, CrewStatus::Rejected, Some(message)).await?;
    info!("Crew {} rejected by {}", crew.id, user_id);

    record_action(
        &*store,
        &user_id,
        "reject_crew",
        serde_json::json!({ "crewId": crew.id, "title": crew.title, "reason": reason }),
    )
    .await;

    if let Err(e) =
        publish_crew_status_event(&crew_status_event(CREW_REJECTED, &crew, Some(&reason))).await
    {
        error!("Failed to publish crew_rejected event: {:?}", e);
    }

    Ok(Json(serde_json::json!({ "crew": crew })))
}

// PATCH /admin/crews/:id/games/:game_id
pub async fn update_crew_game<S>(
    State(store): State<Arc<S>>,
    Path((crew_id, game_id)): Path<(String, String)>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CrewGameUpdateRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    let crew = store.get_crew(&crew_id).await?;
    if crew.status != CrewStatus::Active {
        return Err(AppError::bad_request(
            "Results can only be recorded for active crews",
        ));
    }

    let existing = store
        .list_crew_games(&crew_id)
        .await?
        .into_iter()
        .find(|g| g.game_id == game_id);

    let mut entry = match existing {
        Some(entry) => entry,
        None => {
            let game = store.get_game(&game_id).await?;
            CrewGame {
                crew_id: crew_id.clone(),
                game_id: game.id,
                name: game.name,
                date: game.date,
                season: game.season,
                participated: false,
                points: 0,
                updated_at: now_str(),
            }
        }
    };

    if let Some(participated) = payload.participated {
        entry.participated = participated;
    }
    if let Some(points) = payload.points {
        entry.points = points;
    }
    entry.updated_at = now_str();

    store.put_crew_games(vec![entry.clone()]).await?;

    record_action(
        &*store,
        &user_id,
        "record_crew_game",
        serde_json::json!({
            "crewId": crew_id,
            "gameId": entry.game_id,
            "participated": entry.participated,
            "points": entry.points,
        }),
    )
    .await;

    Ok(Json(serde_json::json!({ "game": entry })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pena_shared::store::memory::MemoryStore;
    use pena_shared::store::CrewStore;

    fn pending_crew(id: &str) -> Crew {
        Crew {
            id: id.to_string(),
            slug: id.to_string(),
            title: id.to_string(),
            responsable: vec!["member-1".to_string()],
            members_names: vec![],
            status: CrewStatus::Pending,
            created_by: "member-1".to_string(),
            created_at: now_str(),
            updated_at: now_str(),
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_transition_refuses_moves_outside_the_state_machine() {
        let store = MemoryStore::new();
        store.create_crew(pending_crew("crew-1")).await.unwrap();

        let err = transition(&store, "crew-1", CrewStatus::Pending, None)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let crew = store.get_crew("crew-1").await.unwrap();
        assert_eq!(crew.status, CrewStatus::Pending);
        assert_eq!(crew.version, 0);

        let approved = transition(&store, "crew-1", CrewStatus::Active, None)
            .await
            .unwrap();
        assert_eq!(approved.status, CrewStatus::Active);
    }
}
