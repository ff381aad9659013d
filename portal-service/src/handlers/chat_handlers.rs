use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use log::{debug, error, warn};
use pena_shared::models::{now_str, ChatMessage};
use pena_shared::store::{ChatStore, PortalStore, StoreError};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::handlers::require_staff;
use crate::models::{ChatMessageRequest, ConversationSummary};

pub const MAX_CHAT_MESSAGE_LEN: usize = 2000;

fn validate_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::bad_request("Message cannot be empty"));
    }
    if text.chars().count() > MAX_CHAT_MESSAGE_LEN {
        return Err(AppError::bad_request(format!(
            "Message is longer than {} characters",
            MAX_CHAT_MESSAGE_LEN
        )));
    }
    Ok(text.to_string())
}

async fn post_message<S>(
    store: &S,
    conversation_id: &str,
    sender_id: &str,
    from_staff: bool,
    text: &str,
) -> Result<ChatMessage>
where
    S: ChatStore + ?Sized,
{
    let message = ChatMessage {
        id: Uuid::new_v4().to_string(),
        conversation_id: conversation_id.to_string(),
        sender_id: sender_id.to_string(),
        from_staff,
        text: validate_text(text)?,
        created_at: now_str(),
    };
    Ok(store.create_chat_message(message).await?)
}

/// Server-sent events carrying every new message of one conversation.
fn conversation_stream<S>(
    store: &S,
    conversation_id: String,
) -> Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>>
where
    S: ChatStore + ?Sized,
{
    let mut feed = store.subscribe();

    let stream = async_stream::stream! {
        loop {
            match feed.recv().await {
                Ok(message) => {
                    if message.conversation_id != conversation_id {
                        continue;
                    }
                    match SseEvent::default().event("message").json_data(&message) {
                        Ok(event) => yield Ok::<_, Infallible>(event),
                        Err(e) => error!("Failed to encode chat message {}: {}", message.id, e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Chat stream for {} skipped {} messages", conversation_id, skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("Chat feed closed, ending stream for {}", conversation_id);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// GET /support/messages
pub async fn get_my_messages<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    let messages = store.list_chat_messages(&user_id).await?;
    Ok(Json(serde_json::json!({ "messages": messages })))
}

// POST /support/messages
pub async fn post_my_message<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<ChatMessageRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)>
where
    S: PortalStore,
{
    let message = post_message(&*store, &user_id, &user_id, false, &payload.text).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": message })),
    ))
}

// GET /support/stream
pub async fn stream_my_messages<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
) -> Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>>
where
    S: PortalStore,
{
    conversation_stream(&*store, user_id)
}

// GET /support/conversations
pub async fn list_conversations<S>(
    State(store): State<Arc<S>>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_staff(&*store, &user_id).await?;

    let mut summaries = Vec::new();
    for conversation_id in store.list_conversations().await? {
        let messages = store.list_chat_messages(&conversation_id).await?;
        let user_name = match store.get_user(&conversation_id).await {
            Ok(user) => Some(user.display_name()),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let last = messages.last();
        summaries.push(ConversationSummary {
            conversation_id: conversation_id.clone(),
            user_name,
            message_count: messages.len(),
            last_message: last.map(|m| m.text.clone()),
            last_message_at: last.map(|m| m.created_at.clone()),
        });
    }

    // Most recently active first
    summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));

    Ok(Json(serde_json::json!({ "conversations": summaries })))
}

// GET /support/conversations/:user_id/messages
pub async fn get_conversation<S>(
    State(store): State<Arc<S>>,
    Path(conversation_id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Json<serde_json::Value>>
where
    S: PortalStore,
{
    require_staff(&*store, &user_id).await?;
    let messages = store.list_chat_messages(&conversation_id).await?;
    Ok(Json(serde_json::json!({ "messages": messages })))
}

// POST /support/conversations/:user_id/messages
pub async fn post_staff_message<S>(
    State(store): State<Arc<S>>,
    Path(conversation_id): Path<String>,
    Extension(user_id): Extension<String>,
    Json(payload): Json<ChatMessageRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)>
where
    S: PortalStore,
{
    require_staff(&*store, &user_id).await?;
    let message = post_message(&*store, &conversation_id, &user_id, true, &payload.text).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": message })),
    ))
}

// GET /support/conversations/:user_id/stream
pub async fn stream_conversation<S>(
    State(store): State<Arc<S>>,
    Path(conversation_id): Path<String>,
    Extension(user_id): Extension<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>>>
where
    S: PortalStore,
{
    require_staff(&*store, &user_id).await?;
    Ok(conversation_stream(&*store, conversation_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("  hola  ").unwrap(), "hola");
        assert!(validate_text("   ").is_err());
        assert!(validate_text(&"a".repeat(MAX_CHAT_MESSAGE_LEN + 1)).is_err());
        assert!(validate_text(&"ñ".repeat(MAX_CHAT_MESSAGE_LEN)).is_ok());
    }
}
