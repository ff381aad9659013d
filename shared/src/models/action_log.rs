use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::now_str;

/// Append-only audit record written alongside privileged mutations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    pub id: String,
    pub user_id: String,
    pub action: String,
    #[serde(default)]
    pub details: serde_json::Value,
    pub timestamp: String,
}

impl ActionLog {
    pub fn new(user_id: &str, action: &str, details: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            action: action.to_string(),
            details,
            timestamp: now_str(),
        }
    }
}
