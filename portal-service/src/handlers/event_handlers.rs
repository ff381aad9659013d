use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Local, NaiveDateTime};
use log::info;
use pena_shared::models::{now_str, slugify, Event, EventStatus};
use pena_shared::store::{PortalStore, StoreError};
use std::sync::Arc;
use uuid::Uuid;

use crate::calendar::build_month;
use crate::error::{AppError, Result};
use crate::handlers::{clean_list, load_caller, paginate, record_action, require_staff};
use crate::models::{
    CalendarQuery, CreateEventRequest, EventListQuery, EventResponse, UpdateEventRequest,
};

fn parse_event_status(raw: &str) -> Result<EventStatus> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| AppError::bad_request(format!("Unknown event status: {}", raw)))
}

/// Keeps the events matching every given filter. `search` matches title,
/// description or location case-insensitively.
pub fn filter_events(
    events: Vec<Event>,
    search: Option<&str>,
    tag: Option<&str>,
    status: Option<EventStatus>,
) -> Vec<Event> {
    events
        .into_iter()
        .filter(|e| search.map_or(true, |s| e.matches_search(s)))
        .filter(|e| tag.map_or(true, |t| e.tags.iter().any(|et| et.eq_ignore_ascii_case(t))))
        .filter(|e| status.map_or(true, |s| e.status == s))
        .collect()
}

fn validate_event(event: &Event) -> Result<()> {
    if event.title.trim().is_empty() || event.slug.is_empty() {
        return Err(AppError::bad_request("The event needs a title"));
    }
    if event.ends_at() < event.starts_at() {
        return Err(AppError::bad_request("The event cannot end before it starts"));
    }
    if event.capacity == 0 {
        return Err(AppError::bad_request("Capacity must be at least 1"));
    }
    if event.participants.len() > event.capacity as usize {
        return Err(AppError::bad_request(format!(
            "Capacity cannot drop below the {} people already registered",
            event.participants.len()
        )));
    }
    if !event.price.is_finite() || event.price < 0.0 {
        return Err(AppError::bad_request("Price must be zero or positive"));
    }
    Ok(())
}

async fn ensure_event_slug_free<S>(store: &S, slug: &str, own_id: Option<&str>) -> Result<()>
where
    S: PortalStore + ?Sized,
{
    match store.get_event_by_slug(slug).await {
        Ok(existing) if Some(existing.id.as_str()) != own_id => Err(AppError::conflict(format!(
            "An event named like '{}' already exists",
            existing.title
        ))),
        Ok(_) | Err(StoreError::NotFound(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// GET /events
pub async fn list_events<S>(
    State(store): State<Arc<S>>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let status = query.status.as_deref().map(parse_event_status).transpose()?;

    let events = filter_events(
        store.list_events().await?,
        query.search.as_deref(),
        query.tag.as_deref(),
        status,
    );

    let page = paginate(events, query.limit, query.offset);
    let events: Vec<EventResponse> = page.items.into_iter().map(EventResponse::from).collect();

    Ok(Json(serde_json::json!({
        "events": events,
        "total": page.total,
        "limit": page.limit,
        "offset": page.offset,
    })))
}

// GET /events/:id
pub async fn get_event<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let event = store.get_event(&id).await?;
    Ok(Json(serde_json::json!({ "event": EventResponse::from(event) })))
}

// GET /events/by-slug/:slug
pub async fn get_event_by_slug<S>(
    State(store): State<Arc<S>>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let event = store.get_event_by_slug(&slug).await?;
    Ok(Json(serde_json::json!({ "event": EventResponse::from(event) })))
}

// GET /calendar
pub async fn get_calendar<S>(
    State(store): State<Arc<S>>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let events = store.list_events().await?;
    let days = build_month(&events, query.year, query.month).ok_or_else(|| {
        AppError::bad_request(format!("Invalid month {}-{}", query.year, query.month))
    })?;

    Ok(Json(serde_json::json!({
        "year": query.year,
        "month": query.month,
        "days": days,
    })))
}

// POST /events
pub async fn create_event<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)>
where
    S: PortalStore,
{
    require_staff(&*store, &user_id).await?;

    let title = payload.title.trim().to_string();
    let now = now_str();
    let event = Event {
        id: Uuid::new_v4().to_string(),
        slug: slugify(&title),
        title,
        description: payload.description.trim().to_string(),
        start_date: payload.start_date,
        start_time: payload.start_time,
        end_date: payload.end_date,
        end_time: payload.end_time,
        location: payload.location.trim().to_string(),
        capacity: payload.capacity,
        price: payload.price,
        min_age: payload.min_age,
        collaborators: clean_list(payload.collaborators),
        participants: vec![],
        organizer: payload.organizer.unwrap_or_else(|| user_id.clone()),
        tags: clean_list(payload.tags),
        image_url: payload.image_url,
        status: EventStatus::Active,
        created_at: now.clone(),
        updated_at: now,
        version: 0,
    };

    validate_event(&event)?;
    ensure_event_slug_free(&*store, &event.slug, None).await?;

    let created = store.create_event(event).await?;
    info!("Event {} created by {}", created.id, user_id);

    record_action(
        &*store,
        &user_id,
        "create_event",
        serde_json::json!({ "eventId": created.id, "title": created.title }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "event": EventResponse::from(created) })),
    ))
}

// PATCH /events/:id
pub async fn update_event<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let caller = load_caller(&*store, &user_id).await?;
    let mut event = store.get_event(&id).await?;

    if !caller.is_staff_or_admin() && event.organizer != user_id {
        return Err(AppError::forbidden(
            "Only staff or the event's organizer can modify it",
        ));
    }

    if let Some(version) = payload.version {
        if version != event.version {
            return Err(AppError::conflict(
                "The event was changed by someone else, reload and try again",
            ));
        }
    }

    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        let slug = slugify(&title);
        if slug != event.slug {
            ensure_event_slug_free(&*store, &slug, Some(&event.id)).await?;
        }
        event.title = title;
        event.slug = slug;
    }
    if let Some(description) = payload.description {
        event.description = description.trim().to_string();
    }
    if let Some(start_date) = payload.start_date {
        event.start_date = start_date;
    }
    if let Some(start_time) = payload.start_time {
        event.start_time = start_time;
    }
    if let Some(end_date) = payload.end_date {
        event.end_date = end_date;
    }
    if let Some(end_time) = payload.end_time {
        event.end_time = end_time;
    }
    if let Some(location) = payload.location {
        event.location = location.trim().to_string();
    }
    if let Some(capacity) = payload.capacity {
        event.capacity = capacity;
    }
    if let Some(price) = payload.price {
        event.price = price;
    }
    if let Some(min_age) = payload.min_age {
        event.min_age = min_age.into_option();
    }
    if let Some(collaborators) = payload.collaborators {
        event.collaborators = clean_list(collaborators);
    }
    if let Some(tags) = payload.tags {
        event.tags = clean_list(tags);
    }
    if let Some(image_url) = payload.image_url {
        event.image_url = image_url.into_option();
    }
    if let Some(status) = payload.status {
        event.status = status;
    }

    validate_event(&event)?;

    let updated = store.update_event(event).await?;

    record_action(
        &*store,
        &user_id,
        "update_event",
        serde_json::json!({ "eventId": updated.id, "title": updated.title }),
    )
    .await;

    Ok(Json(serde_json::json!({ "event": EventResponse::from(updated) })))
}

/// Why `user` may not join `event` at `now`, if anything.
fn join_refusal(event: &Event, age: u32, user_id: &str, now: NaiveDateTime) -> Option<String> {
    if event.status != EventStatus::Active {
        return Some(format!("The event is {}", event.status));
    }
    if event.ends_at() < now {
        return Some("The event is already over".to_string());
    }
    if event.participants.iter().any(|p| p == user_id) {
        return Some("You are already registered for this event".to_string());
    }
    if event.is_full() {
        return Some("The event is full".to_string());
    }
    if let Some(min_age) = event.min_age {
        if age < min_age {
            return Some(format!("The minimum age for this event is {}", min_age));
        }
    }
    None
}

// POST /events/:id/participants
pub async fn join_event<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let user = load_caller(&*store, &user_id).await?;
    let mut event = store.get_event(&id).await?;

    let age = user.age_on(event.start_date);
    if let Some(reason) = join_refusal(&event, age, &user_id, Local::now().naive_local()) {
        return Err(AppError::bad_request(reason));
    }

    event.participants.push(user_id.clone());
    let updated = store.update_event(event).await?;
    info!("User {} joined event {}", user_id, updated.id);

    Ok(Json(serde_json::json!({ "event": EventResponse::from(updated) })))
}

// DELETE /events/:id/participants
pub async fn leave_event<S>(
    State(store): State<Arc<S>>,
    Path(id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let mut event = store.get_event(&id).await?;

    let before = event.participants.len();
    event.participants.retain(|p| p != &user_id);
    if event.participants.len() == before {
        return Err(AppError::not_found("You are not registered for this event"));
    }

    let updated = store.update_event(event).await?;
    info!("User {} left event {}", user_id, updated.id);

    Ok(Json(serde_json::json!({ "event": EventResponse::from(updated) })))
}
