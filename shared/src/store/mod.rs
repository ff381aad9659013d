use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::models::{
    ActionLog, ChatMessage, Crew, CrewGame, CrewStatus, Event, GalleryImage, Game, Message,
    MessageType, PushToken, User,
};

pub mod dynamo;
pub mod memory;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// A guarded write saw a different state than the caller expected.
    #[error("Condition failed: {0}")]
    ConditionFailed(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_dynamo::Error> for StoreError {
    fn from(e: serde_dynamo::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list_events(&self) -> StoreResult<Vec<Event>>;
    async fn get_event(&self, id: &str) -> StoreResult<Event>;
    async fn get_event_by_slug(&self, slug: &str) -> StoreResult<Event>;
    async fn create_event(&self, event: Event) -> StoreResult<Event>;
    /// Writes `event` if the stored version still equals `event.version`,
    /// returning the record with its version bumped.
    async fn update_event(&self, event: Event) -> StoreResult<Event>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: &str) -> StoreResult<User>;
    async fn create_user(&self, user: User) -> StoreResult<User>;
    async fn update_user(&self, user: User) -> StoreResult<User>;
}

#[async_trait]
pub trait CrewStore: Send + Sync {
    async fn list_crews(&self, status: Option<CrewStatus>) -> StoreResult<Vec<Crew>>;
    async fn get_crew(&self, id: &str) -> StoreResult<Crew>;
    async fn get_crew_by_slug(&self, slug: &str) -> StoreResult<Crew>;
    async fn create_crew(&self, crew: Crew) -> StoreResult<Crew>;
    /// Optimistic update keyed on `crew.version`. Never changes the status.
    async fn update_crew(&self, crew: Crew) -> StoreResult<Crew>;
    /// Atomically checks that the stored status is `expected`, moves the
    /// crew to `next` and writes `message` if one is given. Nothing is
    /// written when the check fails.
    async fn transition_crew_status(
        &self,
        crew_id: &str,
        expected: CrewStatus,
        next: CrewStatus,
        message: Option<Message>,
    ) -> StoreResult<Crew>;
    async fn list_crew_games(&self, crew_id: &str) -> StoreResult<Vec<CrewGame>>;
    /// Inserts or replaces entries in the crew's games subcollection.
    async fn put_crew_games(&self, games: Vec<CrewGame>) -> StoreResult<()>;
    async fn list_all_crew_games(&self) -> StoreResult<Vec<CrewGame>>;
}

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn list_games(&self) -> StoreResult<Vec<Game>>;
    async fn get_game(&self, id: &str) -> StoreResult<Game>;
    async fn create_game(&self, game: Game) -> StoreResult<Game>;
    async fn update_game(&self, game: Game) -> StoreResult<Game>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn list_messages(&self, crew_id: &str) -> StoreResult<Vec<Message>>;
    async fn create_message(&self, message: Message) -> StoreResult<Message>;
    /// Batched delete by id; ids that no longer exist are ignored.
    async fn delete_messages(&self, ids: &[String]) -> StoreResult<()>;

    async fn list_messages_of_type(
        &self,
        crew_id: &str,
        message_type: MessageType,
    ) -> StoreResult<Vec<Message>> {
        Ok(self
            .list_messages(crew_id)
            .await?
            .into_iter()
            .filter(|m| m.message_type == message_type)
            .collect())
    }
}

#[async_trait]
pub trait ActionLogStore: Send + Sync {
    async fn append_log(&self, log: ActionLog) -> StoreResult<()>;
    /// Most recent first.
    async fn recent_logs(&self, limit: usize) -> StoreResult<Vec<ActionLog>>;
}

#[async_trait]
pub trait GalleryStore: Send + Sync {
    async fn list_images(&self) -> StoreResult<Vec<GalleryImage>>;
    async fn create_image(&self, image: GalleryImage) -> StoreResult<GalleryImage>;
    async fn delete_image(&self, id: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Oldest first.
    async fn list_chat_messages(&self, conversation_id: &str) -> StoreResult<Vec<ChatMessage>>;
    async fn create_chat_message(&self, message: ChatMessage) -> StoreResult<ChatMessage>;
    /// Ids of every conversation with at least one message.
    async fn list_conversations(&self) -> StoreResult<Vec<String>>;
    /// Live feed of every chat message written from now on. Callers filter
    /// by conversation.
    fn subscribe(&self) -> broadcast::Receiver<ChatMessage>;
}

#[async_trait]
pub trait PushTokenStore: Send + Sync {
    async fn save_push_token(&self, token: PushToken) -> StoreResult<()>;
    async fn get_push_tokens(&self, user_ids: &[String]) -> StoreResult<Vec<PushToken>>;
}

/// Everything the portal reads and writes.
pub trait PortalStore:
    EventStore
    + UserStore
    + CrewStore
    + GameStore
    + MessageStore
    + ActionLogStore
    + GalleryStore
    + ChatStore
    + PushTokenStore
{
}

impl<T> PortalStore for T where
    T: EventStore
        + UserStore
        + CrewStore
        + GameStore
        + MessageStore
        + ActionLogStore
        + GalleryStore
        + ChatStore
        + PushTokenStore
{
}
