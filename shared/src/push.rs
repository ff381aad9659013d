use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

use crate::models::events::{CrewStatusEvent, CREW_APPROVED, CREW_REJECTED};
use crate::models::PushToken;

pub const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Debug, Serialize)]
pub struct ExpoPushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExpoPushResponse {
    pub data: Vec<ExpoPushTicket>,
}

#[derive(Debug, Deserialize)]
pub struct ExpoPushTicket {
    pub status: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Client for the Expo push API. The endpoint comes from `EXPO_PUSH_URL`
/// when set.
#[derive(Debug, Clone)]
pub struct PushClient {
    http: Client,
    endpoint: String,
}

impl Default for PushClient {
    fn default() -> Self {
        Self::new(EXPO_PUSH_URL)
    }
}

impl PushClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_env() -> Self {
        match env::var("EXPO_PUSH_URL") {
            Ok(url) if !url.is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    /// Sends the same notification to every token in one Expo request.
    pub async fn send(
        &self,
        tokens: &[PushToken],
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> Result<Vec<ExpoPushTicket>, String> {
        if tokens.is_empty() {
            info!("No push tokens provided, skipping push notification");
            return Ok(Vec::new());
        }

        let messages: Vec<ExpoPushMessage> = tokens
            .iter()
            .map(|token| ExpoPushMessage {
                to: token.push_token.clone(),
                title: title.to_string(),
                body: body.to_string(),
                data: data.clone(),
                sound: Some("default".to_string()),
            })
            .collect();

        info!("Sending {} push notifications to Expo", messages.len());

        let response = self
            .http
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(&messages)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send push notifications: {}", e);
                format!("Failed to send push notifications: {}", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Expo push API returned {}: {}", status, error_text);
            return Err(format!("Expo push API error: {} - {}", status, error_text));
        }

        let push_response: ExpoPushResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Expo push response: {}", e);
            format!("Failed to parse push response: {}", e)
        })?;

        for (i, ticket) in push_response.data.iter().enumerate() {
            if ticket.status != "ok" {
                error!(
                    "Push notification {} failed: status={}, message={:?}",
                    i, ticket.status, ticket.message
                );
            }
        }

        Ok(push_response.data)
    }

    /// Notifies a crew's responsables that their crew was approved or rejected.
    pub async fn send_crew_status(
        &self,
        tokens: &[PushToken],
        event: &CrewStatusEvent,
    ) -> Result<Vec<ExpoPushTicket>, String> {
        let (title, body) = crew_status_notification(event)
            .ok_or_else(|| format!("No notification for event type {}", event.event_type))?;

        let data = serde_json::json!({
            "type": event.event_type,
            "crewId": event.crew_id,
            "crewTitle": event.crew_title,
        });

        self.send(tokens, &title, &body, Some(data)).await
    }
}

/// Title and body shown to a crew's responsables when its status settles.
/// `None` for event types that do not notify anyone.
pub fn crew_status_notification(event: &CrewStatusEvent) -> Option<(String, String)> {
    match event.event_type.as_str() {
        CREW_APPROVED => Some((
            "Peña aprobada".to_string(),
            format!("Tu peña \"{}\" ya está activa.", event.crew_title),
        )),
        CREW_REJECTED => {
            let body = match event.reason.as_deref().map(str::trim) {
                Some(reason) if !reason.is_empty() => format!(
                    "Tu peña \"{}\" ha sido rechazada: {}",
                    event.crew_title, reason
                ),
                _ => format!("Tu peña \"{}\" ha sido rechazada.", event.crew_title),
            };
            Some(("Peña rechazada".to_string(), body))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: &str, reason: Option<&str>) -> CrewStatusEvent {
        CrewStatusEvent {
            event_type: event_type.to_string(),
            crew_id: "crew-1".to_string(),
            crew_title: "Los Txirenes".to_string(),
            responsable_ids: vec!["user-1".to_string()],
            reason: reason.map(str::to_string),
            timestamp: "2024-07-01T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_crew_status_notification_text() {
        let (title, body) = crew_status_notification(&event(CREW_APPROVED, None)).unwrap();
        assert_eq!(title, "Peña aprobada");
        assert!(body.contains("Los Txirenes"));

        let (_, body) =
            crew_status_notification(&event(CREW_REJECTED, Some("Falta un responsable"))).unwrap();
        assert!(body.ends_with("Falta un responsable"));

        let (_, body) = crew_status_notification(&event(CREW_REJECTED, Some("  "))).unwrap();
        assert!(body.ends_with("rechazada."));

        assert!(crew_status_notification(&event("crew_created", None)).is_none());
    }

    #[tokio::test]
    async fn test_no_tokens_skips_request() {
        let client = PushClient::new("http://127.0.0.1:9/unreachable");
        let tickets = client.send(&[], "t", "b", None).await.unwrap();
        assert!(tickets.is_empty());
    }
}
