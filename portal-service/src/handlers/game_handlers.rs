use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use pena_shared::models::{now_str, Game, GameStatus};
use pena_shared::store::PortalStore;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::handlers::{record_action, require_admin};
use crate::models::{CreateGameRequest, GameListQuery, RankingQuery, UpdateGameRequest};
use crate::ranking::compute_ranking;

// GET /games
pub async fn list_games<S>(
    State(store): State<Arc<S>>,
    Query(query): Query<GameListQuery>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let games: Vec<Game> = store
        .list_games()
        .await?
        .into_iter()
        .filter(|g| query.status.map_or(true, |s| g.status == s))
        .filter(|g| {
            query
                .season
                .as_deref()
                .map_or(true, |s| g.season.as_deref() == Some(s))
        })
        .collect();

    Ok(Json(serde_json::json!({ "games": games })))
}

// POST /games
pub async fn create_game<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("The game needs a name"));
    }

    let now = now_str();
    let game = Game {
        id: Uuid::new_v4().to_string(),
        name,
        date: payload.date,
        time: payload.time,
        location: payload.location.trim().to_string(),
        season: payload.season.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        min_participants: payload.min_participants,
        score: payload.score,
        status: GameStatus::Active,
        created_at: now.clone(),
        updated_at: now,
    };

    let created = store.create_game(game).await?;

    record_action(
        &*store,
        &user_id,
        "create_game",
        serde_json::json!({ "gameId": created.id, "name": created.name }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "game": created })),
    ))
}

// PATCH /games/:id
pub async fn update_game<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_admin(&*store, &user_id).await?;

    let mut game = store.get_game(&id).await?;

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::bad_request("The game needs a name"));
        }
        game.name = name;
    }
    if let Some(date) = payload.date {
        game.date = date;
    }
    if let Some(time) = payload.time {
        game.time = time.into_option();
    }
    if let Some(location) = payload.location {
        game.location = location.trim().to_string();
    }
    if let Some(season) = payload.season {
        game.season = season.into_option();
    }
    if let Some(min_participants) = payload.min_participants {
        game.min_participants = min_participants;
    }
    if let Some(score) = payload.score {
        game.score = score;
    }
    if let Some(status) = payload.status {
        game.status = status;
    }

    let updated = store.update_game(game).await?;

    record_action(
        &*store,
        &user_id,
        "update_game",
        serde_json::json!({ "gameId": updated.id, "status": updated.status }),
    )
    .await;

    Ok(Json(serde_json::json!({ "game": updated })))
}

// GET /ranking
pub async fn get_ranking<S>(
    State(store): State<Arc<S>>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let crews = store.list_crews(None).await?;
    let crew_games = store.list_all_crew_games().await?;
    let ranking = compute_ranking(&crews, &crew_games, query.season.as_deref());

    Ok(Json(serde_json::json!({
        "season": query.season,
        "ranking": ranking,
    })))
}
