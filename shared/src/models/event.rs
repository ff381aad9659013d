use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventStatus {
    #[default]
    #[serde(rename = "Activo")]
    Active,
    #[serde(rename = "Cancelado")]
    Cancelled,
    #[serde(rename = "Finalizado")]
    Finished,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Active => "Activo",
            EventStatus::Cancelled => "Cancelado",
            EventStatus::Finished => "Finalizado",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub slug: String,
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
    pub participants: Vec<String>,
    pub organizer: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: u64,
}

impl Event {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.start_date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.end_date.and_time(self.end_time)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.capacity as usize
    }

    pub fn remaining_places(&self) -> u32 {
        self.capacity
            .saturating_sub(self.participants.len().min(u32::MAX as usize) as u32)
    }

    /// Case-insensitive substring match over title, description and location.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.title, &self.description, &self.location]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Whether the event covers `day`, inclusive on both ends.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}
