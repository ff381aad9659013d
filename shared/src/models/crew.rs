use serde::{Deserialize, Serialize};
use std::fmt;

/// A crew may have at most this many responsables.
pub const MAX_RESPONSABLES: usize = 2;

/// Lifecycle of a crew. Only `Pending` has outgoing transitions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CrewStatus {
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Activo")]
    Active,
    #[serde(rename = "Rechazado")]
    Rejected,
    #[serde(rename = "deleted")]
    Deleted,
}

impl CrewStatus {
    pub const ALL: [CrewStatus; 4] = [
        CrewStatus::Pending,
        CrewStatus::Active,
        CrewStatus::Rejected,
        CrewStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrewStatus::Pending => "Pendiente",
            CrewStatus::Active => "Activo",
            CrewStatus::Rejected => "Rechazado",
            CrewStatus::Deleted => "deleted",
        }
    }

    pub fn can_transition_to(&self, next: CrewStatus) -> bool {
        matches!(
            (self, next),
            (CrewStatus::Pending, CrewStatus::Active)
                | (CrewStatus::Pending, CrewStatus::Rejected)
                | (CrewStatus::Pending, CrewStatus::Deleted)
        )
    }
}

impl fmt::Display for CrewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CrewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrewStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown crew status: {}", s))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Crew {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub responsable: Vec<String>,
    #[serde(default)]
    pub members_names: Vec<String>,
    #[serde(default)]
    pub status: CrewStatus,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: u64,
}

impl Crew {
    pub fn is_responsable(&self, user_id: &str) -> bool {
        self.responsable.iter().any(|r| r == user_id)
    }
}

/// Participation of a crew in one game, stored in the crew's `games`
/// subcollection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrewGame {
    pub crew_id: String,
    pub game_id: String,
    pub name: String,
    pub date: chrono::NaiveDate,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub participated: bool,
    #[serde(default)]
    pub points: i64,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_transitions() {
        assert!(CrewStatus::Pending.can_transition_to(CrewStatus::Active));
        assert!(CrewStatus::Pending.can_transition_to(CrewStatus::Rejected));
        assert!(CrewStatus::Pending.can_transition_to(CrewStatus::Deleted));
        assert!(!CrewStatus::Pending.can_transition_to(CrewStatus::Pending));

        for terminal in [CrewStatus::Active, CrewStatus::Rejected, CrewStatus::Deleted] {
            for next in CrewStatus::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_value(CrewStatus::Pending).unwrap(),
            serde_json::json!("Pendiente")
        );
        assert_eq!(
            serde_json::from_value::<CrewStatus>(serde_json::json!("deleted")).unwrap(),
            CrewStatus::Deleted
        );
        assert_eq!("activo".parse::<CrewStatus>().unwrap(), CrewStatus::Active);
        assert!("archived".parse::<CrewStatus>().is_err());
    }
}
