use chrono::{NaiveDate, NaiveTime};
use pena_shared::models::{
    Crew, Event, GalleryImage, GameStatus, Role, User, UserPreferences, Visibility,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Distinguishes "set to null" from "leave unchanged" in PATCH bodies.
/// Use with `#[serde(default, deserialize_with = "optional_field")]` on an
/// `Option<OptionalField<T>>`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionalField<T> {
    Value(T),
    Null,
}

impl<T> OptionalField<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            OptionalField::Value(v) => Some(v),
            OptionalField::Null => None,
        }
    }
}

pub fn optional_field<'de, D, T>(deserializer: D) -> Result<Option<OptionalField<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(match Option::<T>::deserialize(deserializer)? {
        Some(value) => OptionalField::Value(value),
        None => OptionalField::Null,
    }))
}

// Users

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dni: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub preferences: Option<UserPreferences>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "optional_field")]
    pub phone: Option<OptionalField<String>>,
    pub preferences: Option<UserPreferences>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub role: Option<Role>,
    pub is_staff: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPushTokenRequest {
    pub push_token: String,
    pub platform: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub name: String,
}

impl From<&User> for StaffMember {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.display_name(),
        }
    }
}

// Events

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize, Debug)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_date: NaiveDate,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub location: String,
    pub capacity: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub collaborators: Vec<String>,
    #[serde(default)]
    pub organizer: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub capacity: Option<u32>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "optional_field")]
    pub min_age: Option<OptionalField<u32>>,
    pub collaborators: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "optional_field")]
    pub image_url: Option<OptionalField<String>>,
    pub status: Option<pena_shared::models::EventStatus>,
    /// Version the form was loaded at; a mismatch means someone else saved first.
    pub version: Option<u64>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub remaining_places: u32,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        let remaining_places = event.remaining_places();
        Self {
            event,
            remaining_places,
        }
    }
}

// Crews

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCrewRequest {
    pub title: String,
    #[serde(default)]
    pub responsable: Vec<String>,
    #[serde(default)]
    pub members_names: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCrewRequest {
    pub title: Option<String>,
    pub responsable: Option<Vec<String>>,
    pub members_names: Option<Vec<String>>,
    pub version: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RejectCrewRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct CrewListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CrewGameUpdateRequest {
    pub participated: Option<bool>,
    pub points: Option<i64>,
}

/// Crew as shown to the public: no audit fields.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PublicCrew {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub members_names: Vec<String>,
}

impl From<Crew> for PublicCrew {
    fn from(crew: Crew) -> Self {
        Self {
            id: crew.id,
            slug: crew.slug,
            title: crew.title,
            members_names: crew.members_names,
        }
    }
}

// Games

#[derive(Deserialize, Debug, Default)]
pub struct GameListQuery {
    pub status: Option<GameStatus>,
    pub season: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub min_participants: u32,
    #[serde(default)]
    pub score: i64,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGameRequest {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_field")]
    pub time: Option<OptionalField<NaiveTime>>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "optional_field")]
    pub season: Option<OptionalField<String>>,
    pub min_participants: Option<u32>,
    pub score: Option<i64>,
    pub status: Option<GameStatus>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RankingQuery {
    pub season: Option<String>,
}

// Gallery

#[derive(Deserialize, Debug, Default)]
pub struct GalleryQuery {
    pub tag: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageRequest {
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Serialize, Debug)]
pub struct GalleryResponse {
    pub images: Vec<GalleryImage>,
}

// Support chat

#[derive(Deserialize, Debug)]
pub struct ChatMessageRequest {
    pub text: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub user_name: Option<String>,
    pub message_count: usize,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
}

// Admin

#[derive(Deserialize, Debug, Default)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

/// Standard list envelope for paginated endpoints.
#[derive(Serialize, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
