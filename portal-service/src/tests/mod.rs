use axum::Router;
use chrono::{Duration, Local, NaiveDate, NaiveTime};
use pena_shared::auth::{JwtSecret, TEST_JWT_SECRET};
use pena_shared::models::{
    now_str, slugify, Event, EventStatus, Game, GameStatus, Role, User, UserPreferences,
};
use pena_shared::store::memory::MemoryStore;
use pena_shared::store::{EventStore, GameStore, UserStore};
use pena_shared::test_utils::test_logging::init_test_logging;
use std::env;
use std::sync::Arc;
use uuid::Uuid;

use crate::routes::create_router_with_store;

mod crew_handlers_test;
mod event_handlers_test;
mod user_handlers_test;

pub const ADMIN_ID: &str = "admin-1";
pub const STAFF_ID: &str = "staff-1";
pub const MEMBER_ID: &str = "member-1";
pub const OTHER_MEMBER_ID: &str = "member-2";

/// Router over a fresh in-memory store with an admin, a staff member and two
/// regular members already registered.
pub async fn create_test_app() -> (Router, Arc<MemoryStore>) {
    init_test_logging();

    // Skip actual SNS publishing
    env::set_var("TEST_SNS", "true");

    let store = Arc::new(MemoryStore::new());
    seed_user(&store, ADMIN_ID, Role::Admin, false).await;
    seed_user(&store, STAFF_ID, Role::User, true).await;
    seed_user(&store, MEMBER_ID, Role::User, false).await;
    seed_user(&store, OTHER_MEMBER_ID, Role::User, false).await;

    let app = create_router_with_store(
        store.clone(),
        "",
        JwtSecret::new(Some(TEST_JWT_SECRET.to_string())),
    );
    (app, store)
}

pub async fn seed_user(store: &MemoryStore, id: &str, role: Role, is_staff: bool) -> User {
    let now = now_str();
    let user = User {
        id: id.to_string(),
        first_name: format!("Nombre {}", id),
        last_name: "Prueba".to_string(),
        email: format!("{}@example.com", id),
        dni: format!("DNI-{}", id),
        phone: None,
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
        role,
        is_staff,
        preferences: UserPreferences::default(),
        created_at: now.clone(),
        updated_at: now,
    };
    store.create_user(user).await.unwrap()
}

pub async fn seed_game(store: &MemoryStore, name: &str, status: GameStatus) -> Game {
    let now = now_str();
    let game = Game {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        date: Local::now().date_naive() + Duration::days(10),
        time: None,
        location: "Plaza Mayor".to_string(),
        season: Some("2026".to_string()),
        min_participants: 2,
        score: 10,
        status,
        created_at: now.clone(),
        updated_at: now,
    };
    store.create_game(game).await.unwrap()
}

/// Active event starting `days_ahead` days from today.
pub async fn seed_event(
    store: &MemoryStore,
    title: &str,
    description: &str,
    location: &str,
    days_ahead: i64,
) -> Event {
    let now = now_str();
    let date = Local::now().date_naive() + Duration::days(days_ahead);
    let event = Event {
        id: Uuid::new_v4().to_string(),
        slug: slugify(title),
        title: title.to_string(),
        description: description.to_string(),
        start_date: date,
        start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        end_date: date,
        end_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
        location: location.to_string(),
        capacity: 2,
        price: 0.0,
        min_age: None,
        collaborators: vec![],
        participants: vec![],
        organizer: STAFF_ID.to_string(),
        tags: vec!["fiestas".to_string()],
        image_url: None,
        status: EventStatus::Active,
        created_at: now.clone(),
        updated_at: now,
        version: 0,
    };
    store.create_event(event).await.unwrap()
}
