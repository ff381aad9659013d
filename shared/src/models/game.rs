use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameStatus {
    #[default]
    #[serde(rename = "Activo")]
    Active,
    #[serde(rename = "Finalizado")]
    Finished,
    #[serde(rename = "Cancelado")]
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
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
    /// Points awarded to a crew that takes part.
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub status: GameStatus,
    pub created_at: String,
    pub updated_at: String,
}
