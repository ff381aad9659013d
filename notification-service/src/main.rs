use aws_lambda_events::event::sns::SnsEvent;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log::{error, info, warn};
use pena_shared::config::TableNames;
use pena_shared::models::events::{CrewStatusEvent, CREW_APPROVED, CREW_REJECTED};
use pena_shared::push::PushClient;
use pena_shared::store::dynamo::DynamoStore;
use pena_shared::store::PushTokenStore;
use std::sync::Arc;

mod errors;

use errors::NotificationError;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Logging initialized with env_logger");
    info!("Starting Notification Service Lambda");

    let store = Arc::new(DynamoStore::new(TableNames::from_env()).await);
    let push = PushClient::from_env();

    lambda_runtime::run(service_fn(|event| handler(event, store.clone(), push.clone()))).await?;
    Ok(())
}

/// Parses an SNS message body into a crew status event we know how to notify.
fn parse_crew_event(raw: &str) -> Option<CrewStatusEvent> {
    match serde_json::from_str::<CrewStatusEvent>(raw) {
        Ok(event) if event.event_type == CREW_APPROVED || event.event_type == CREW_REJECTED => {
            Some(event)
        }
        Ok(event) => {
            warn!("Unexpected event type: {}", event.event_type);
            None
        }
        Err(e) => {
            error!("Failed to parse SNS message: {}, error: {}", raw, e);
            None
        }
    }
}

async fn handler<S>(
    event: LambdaEvent<SnsEvent>,
    store: Arc<S>,
    push: PushClient,
) -> Result<(), Error>
where
    S: PushTokenStore,
{
    for record in event.payload.records {
        let message = record.sns;
        info!("Processing SNS message: {:?}", message.message_id);

        let Some(crew_event) = parse_crew_event(&message.message) else {
            continue;
        };

        // One failed record must not stop the rest of the batch
        if let Err(e) = handle_crew_status(&*store, &push, &crew_event).await {
            error!(
                "Failed to handle {} event for crew_id={}: {}",
                crew_event.event_type, crew_event.crew_id, e
            );
        }
    }

    Ok(())
}

/// Sends the approval or rejection push to every responsable of the crew.
/// Returns how many devices were notified.
async fn handle_crew_status<S>(
    store: &S,
    push: &PushClient,
    event: &CrewStatusEvent,
) -> Result<usize, NotificationError>
where
    S: PushTokenStore + ?Sized,
{
    if event.responsable_ids.is_empty() {
        info!("No responsables to notify for crew_id={}", event.crew_id);
        return Ok(0);
    }

    let tokens = store.get_push_tokens(&event.responsable_ids).await?;

    if tokens.is_empty() {
        info!(
            "No push tokens found for {} responsables of crew_id={}",
            event.responsable_ids.len(),
            event.crew_id
        );
        return Ok(0);
    }

    push.send_crew_status(&tokens, event)
        .await
        .map_err(NotificationError::SendFailed)?;

    info!(
        "Sent {} notifications to {} responsables for crew_id={}",
        event.event_type,
        tokens.len(),
        event.crew_id
    );

    Ok(tokens.len())
}
