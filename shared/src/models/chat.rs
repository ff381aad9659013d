use serde::{Deserialize, Serialize};

/// One line of a support conversation. Each user has exactly one
/// conversation, keyed by their user id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub from_staff: bool,
    pub text: String,
    pub created_at: String,
}
