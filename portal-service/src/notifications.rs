use aws_sdk_sns::Client as SnsClient;
use log::{debug, info, warn};
use pena_shared::models::events::CrewStatusEvent;
use pena_shared::models::{now_str, Crew};
use std::collections::HashMap;
use std::env;
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};

static SNS_CLIENT: OnceCell<SnsClient> = OnceCell::const_new();
static TOPIC_ARN: OnceCell<String> = OnceCell::const_new();

/// Sets the topic crew status events go to. Only the first call takes effect.
pub fn set_topic_arn(arn: &str) {
    if TOPIC_ARN.set(arn.to_string()).is_err() {
        warn!("SNS topic already set; ignoring {}", arn);
    }
}

pub fn crew_status_event(event_type: &str, crew: &Crew, reason: Option<&str>) -> CrewStatusEvent {
    CrewStatusEvent {
        event_type: event_type.to_string(),
        crew_id: crew.id.clone(),
        crew_title: crew.title.clone(),
        responsable_ids: crew.responsable.clone(),
        reason: reason.map(str::to_string),
        timestamp: now_str(),
    }
}

/// Publishes a crew status change to SNS for the notification service.
pub async fn publish_crew_status_event(event: &CrewStatusEvent) -> Result<()> {
    debug!(
        "publish_crew_status_event called for crew_id={}, type={}",
        event.crew_id, event.event_type
    );

    if env::var("TEST_SNS").map(|v| v == "true").unwrap_or(false) {
        debug!(
            "Test mode: skipping SNS publishing of {} for crew_id={}",
            event.event_type, event.crew_id
        );
        return Ok(());
    }

    let client = SNS_CLIENT
        .get_or_init(|| async {
            let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .load()
                .await;
            SnsClient::new(&config)
        })
        .await
        .clone();

    let topic_arn = TOPIC_ARN
        .get()
        .ok_or_else(|| AppError::internal_server_error("SNS_TOPIC_ARN is not configured"))?;

    let message = serde_json::to_string(event).map_err(|e| {
        AppError::internal_server_error(format!("Failed to serialize event payload: {}", e))
    })?;

    let event_type_attr = aws_sdk_sns::types::MessageAttributeValue::builder()
        .data_type("String")
        .string_value(&event.event_type)
        .build()
        .map_err(|e| {
            AppError::internal_server_error(format!("Failed to build message attribute: {}", e))
        })?;

    let mut message_attributes = HashMap::new();
    message_attributes.insert("eventType".to_string(), event_type_attr);

    client
        .publish()
        .topic_arn(topic_arn)
        .message(message)
        .subject("Crew status changed")
        .set_message_attributes(Some(message_attributes))
        .send()
        .await
        .map_err(|e| AppError::internal_server_error(format!("Failed to publish to SNS: {}", e)))?;

    info!(
        "Published {} event for crew_id={}",
        event.event_type, event.crew_id
    );
    Ok(())
}
