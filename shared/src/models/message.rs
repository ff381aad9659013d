use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Reason attached to a crew rejection.
    Rechazo,
    Aviso,
}

/// Notification left for a crew's responsables.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub crew_id: String,
    pub message_type: MessageType,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}
