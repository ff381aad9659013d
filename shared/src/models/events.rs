use serde::{Deserialize, Serialize};

pub const CREW_APPROVED: &str = "crew_approved";
pub const CREW_REJECTED: &str = "crew_rejected";

/// Published to SNS whenever the approval workflow settles a crew.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CrewStatusEvent {
    pub event_type: String,
    pub crew_id: String,
    pub crew_title: String,
    pub responsable_ids: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub timestamp: String,
}
