//! In-process store used for local development and tests. A single write
//! lock around every collection gives `transition_crew_status` the same
//! all-or-nothing behaviour as a DynamoDB transaction.

use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};

use super::{
    ActionLogStore, ChatStore, CrewStore, EventStore, GalleryStore, GameStore, MessageStore,
    PushTokenStore, StoreError, StoreResult, UserStore,
};
use crate::models::{
    now_str, ActionLog, ChatMessage, Crew, CrewGame, CrewStatus, Event, GalleryImage, Game,
    Message, PushToken, User,
};

const CHAT_CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct Collections {
    events: HashMap<String, Event>,
    users: HashMap<String, User>,
    crews: HashMap<String, Crew>,
    crew_games: HashMap<(String, String), CrewGame>,
    games: HashMap<String, Game>,
    messages: HashMap<String, Message>,
    logs: Vec<ActionLog>,
    images: HashMap<String, GalleryImage>,
    chat: Vec<ChatMessage>,
    push_tokens: HashMap<String, PushToken>,
}

pub struct MemoryStore {
    data: RwLock<Collections>,
    chat_feed: broadcast::Sender<ChatMessage>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (chat_feed, _) = broadcast::channel(CHAT_CHANNEL_CAPACITY);
        Self {
            data: RwLock::new(Collections::default()),
            chat_feed,
        }
    }
}

// Withdrawn crews release their slug.
fn crew_slug_taken(data: &Collections, crew: &Crew) -> bool {
    data.crews
        .values()
        .any(|c| c.id != crew.id && c.slug == crew.slug && c.status != CrewStatus::Deleted)
}

fn event_slug_taken(data: &Collections, event: &Event) -> bool {
    data.events
        .values()
        .any(|e| e.id != event.id && e.slug == event.slug)
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let data = self.data.read().await;
        let mut events: Vec<Event> = data.events.values().cloned().collect();
        events.sort_by(|a, b| a.starts_at().cmp(&b.starts_at()).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn get_event(&self, id: &str) -> StoreResult<Event> {
        self.data
            .read()
            .await
            .events
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Event {}", id)))
    }

    async fn get_event_by_slug(&self, slug: &str) -> StoreResult<Event> {
        self.data
            .read()
            .await
            .events
            .values()
            .find(|e| e.slug == slug)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Event with slug {}", slug)))
    }

    async fn create_event(&self, event: Event) -> StoreResult<Event> {
        let mut data = self.data.write().await;
        if data.events.contains_key(&event.id) {
            return Err(StoreError::AlreadyExists(format!("Event {}", event.id)));
        }
        if event_slug_taken(&data, &event) {
            return Err(StoreError::AlreadyExists(format!("An event with slug {}", event.slug)));
        }
        data.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn update_event(&self, mut event: Event) -> StoreResult<Event> {
        let mut data = self.data.write().await;
        let stored = data
            .events
            .get(&event.id)
            .ok_or_else(|| StoreError::NotFound(format!("Event {}", event.id)))?;

        if stored.version != event.version {
            return Err(StoreError::ConditionFailed(format!(
                "Event {} was modified concurrently (expected version {}, found {})",
                event.id, event.version, stored.version
            )));
        }
        if event_slug_taken(&data, &event) {
            return Err(StoreError::AlreadyExists(format!("An event with slug {}", event.slug)));
        }

        event.version += 1;
        event.updated_at = now_str();
        data.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let data = self.data.read().await;
        let mut users: Vec<User> = data.users.values().cloned().collect();
        users.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str(), a.id.as_str()).cmp(&(
                b.last_name.as_str(),
                b.first_name.as_str(),
                b.id.as_str(),
            ))
        });
        Ok(users)
    }

    async fn get_user(&self, id: &str) -> StoreResult<User> {
        self.data
            .read()
            .await
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("User {}", id)))
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut data = self.data.write().await;
        if data.users.contains_key(&user.id) {
            return Err(StoreError::AlreadyExists(format!("User {}", user.id)));
        }
        data.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, mut user: User) -> StoreResult<User> {
        let mut data = self.data.write().await;
        if !data.users.contains_key(&user.id) {
            return Err(StoreError::NotFound(format!("User {}", user.id)));
        }
        user.updated_at = now_str();
        data.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CrewStore for MemoryStore {
    async fn list_crews(&self, status: Option<CrewStatus>) -> StoreResult<Vec<Crew>> {
        let data = self.data.read().await;
        let mut crews: Vec<Crew> = data
            .crews
            .values()
            .filter(|c| status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        crews.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(crews)
    }

    async fn get_crew(&self, id: &str) -> StoreResult<Crew> {
        self.data
            .read()
            .await
            .crews
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Crew {}", id)))
    }

    async fn get_crew_by_slug(&self, slug: &str) -> StoreResult<Crew> {
        self.data
            .read()
            .await
            .crews
            .values()
            .find(|c| c.slug == slug && c.status != CrewStatus::Deleted)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Crew with slug {}", slug)))
    }

    async fn create_crew(&self, crew: Crew) -> StoreResult<Crew> {
        let mut data = self.data.write().await;
        if data.crews.contains_key(&crew.id) {
            return Err(StoreError::AlreadyExists(format!("Crew {}", crew.id)));
        }
        if crew_slug_taken(&data, &crew) {
            return Err(StoreError::AlreadyExists(format!("A crew with slug {}", crew.slug)));
        }
        data.crews.insert(crew.id.clone(), crew.clone());
        Ok(crew)
    }

    async fn update_crew(&self, mut crew: Crew) -> StoreResult<Crew> {
        let mut data = self.data.write().await;
        let stored = data
            .crews
            .get(&crew.id)
            .ok_or_else(|| StoreError::NotFound(format!("Crew {}", crew.id)))?;

        if stored.version != crew.version || stored.status != crew.status {
            return Err(StoreError::ConditionFailed(format!(
                "Crew {} was modified concurrently",
                crew.id
            )));
        }
        if crew_slug_taken(&data, &crew) {
            return Err(StoreError::AlreadyExists(format!("A crew with slug {}", crew.slug)));
        }

        crew.version += 1;
        crew.updated_at = now_str();
        data.crews.insert(crew.id.clone(), crew.clone());
        Ok(crew)
    }

    async fn transition_crew_status(
        &self,
        crew_id: &str,
        expected: CrewStatus,
        next: CrewStatus,
        message: Option<Message>,
    ) -> StoreResult<Crew> {
        let mut data = self.data.write().await;

        let crew = data
            .crews
            .get_mut(crew_id)
            .ok_or_else(|| StoreError::NotFound(format!("Crew {}", crew_id)))?;

        if crew.status != expected {
            debug!(
                "Rejecting status transition for crew {}: stored={}, expected={}",
                crew_id, crew.status, expected
            );
            return Err(StoreError::ConditionFailed(format!(
                "Crew {} is {}, expected {}",
                crew_id, crew.status, expected
            )));
        }

        crew.status = next;
        crew.version += 1;
        crew.updated_at = now_str();
        let updated = crew.clone();

        if let Some(message) = message {
            data.messages.insert(message.id.clone(), message);
        }

        Ok(updated)
    }

    async fn list_crew_games(&self, crew_id: &str) -> StoreResult<Vec<CrewGame>> {
        let data = self.data.read().await;
        let mut games: Vec<CrewGame> = data
            .crew_games
            .values()
            .filter(|g| g.crew_id == crew_id)
            .cloned()
            .collect();
        games.sort_by(|a, b| a.date.cmp(&b.date).then(a.game_id.cmp(&b.game_id)));
        Ok(games)
    }

    async fn put_crew_games(&self, games: Vec<CrewGame>) -> StoreResult<()> {
        let mut data = self.data.write().await;
        for game in games {
            data.crew_games
                .insert((game.crew_id.clone(), game.game_id.clone()), game);
        }
        Ok(())
    }

    async fn list_all_crew_games(&self) -> StoreResult<Vec<CrewGame>> {
        Ok(self.data.read().await.crew_games.values().cloned().collect())
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        let data = self.data.read().await;
        let mut games: Vec<Game> = data.games.values().cloned().collect();
        games.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(games)
    }

    async fn get_game(&self, id: &str) -> StoreResult<Game> {
        self.data
            .read()
            .await
            .games
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Game {}", id)))
    }

    async fn create_game(&self, game: Game) -> StoreResult<Game> {
        let mut data = self.data.write().await;
        if data.games.contains_key(&game.id) {
            return Err(StoreError::AlreadyExists(format!("Game {}", game.id)));
        }
        data.games.insert(game.id.clone(), game.clone());
        Ok(game)
    }

    async fn update_game(&self, mut game: Game) -> StoreResult<Game> {
        let mut data = self.data.write().await;
        if !data.games.contains_key(&game.id) {
            return Err(StoreError::NotFound(format!("Game {}", game.id)));
        }
        game.updated_at = now_str();
        data.games.insert(game.id.clone(), game.clone());
        Ok(game)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn list_messages(&self, crew_id: &str) -> StoreResult<Vec<Message>> {
        let data = self.data.read().await;
        let mut messages: Vec<Message> = data
            .messages
            .values()
            .filter(|m| m.crew_id == crew_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn create_message(&self, message: Message) -> StoreResult<Message> {
        let mut data = self.data.write().await;
        data.messages.insert(message.id.clone(), message.clone());
        Ok(message)
    }

    async fn delete_messages(&self, ids: &[String]) -> StoreResult<()> {
        let mut data = self.data.write().await;
        for id in ids {
            data.messages.remove(id);
        }
        Ok(())
    }
}

#[async_trait]
impl ActionLogStore for MemoryStore {
    async fn append_log(&self, log: ActionLog) -> StoreResult<()> {
        self.data.write().await.logs.push(log);
        Ok(())
    }

    async fn recent_logs(&self, limit: usize) -> StoreResult<Vec<ActionLog>> {
        let data = self.data.read().await;
        Ok(data.logs.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl GalleryStore for MemoryStore {
    async fn list_images(&self) -> StoreResult<Vec<GalleryImage>> {
        let data = self.data.read().await;
        let mut images: Vec<GalleryImage> = data.images.values().cloned().collect();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(images)
    }

    async fn create_image(&self, image: GalleryImage) -> StoreResult<GalleryImage> {
        let mut data = self.data.write().await;
        data.images.insert(image.id.clone(), image.clone());
        Ok(image)
    }

    async fn delete_image(&self, id: &str) -> StoreResult<()> {
        self.data
            .write()
            .await
            .images
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Image {}", id)))
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn list_chat_messages(&self, conversation_id: &str) -> StoreResult<Vec<ChatMessage>> {
        let data = self.data.read().await;
        Ok(data
            .chat
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn create_chat_message(&self, message: ChatMessage) -> StoreResult<ChatMessage> {
        self.data.write().await.chat.push(message.clone());
        // No subscribers is fine
        let _ = self.chat_feed.send(message.clone());
        Ok(message)
    }

    async fn list_conversations(&self) -> StoreResult<Vec<String>> {
        let data = self.data.read().await;
        let mut ids: Vec<String> = data.chat.iter().map(|m| m.conversation_id.clone()).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.chat_feed.subscribe()
    }
}

#[async_trait]
impl PushTokenStore for MemoryStore {
    async fn save_push_token(&self, token: PushToken) -> StoreResult<()> {
        self.data
            .write()
            .await
            .push_tokens
            .insert(token.user_id.clone(), token);
        Ok(())
    }

    async fn get_push_tokens(&self, user_ids: &[String]) -> StoreResult<Vec<PushToken>> {
        let data = self.data.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| data.push_tokens.get(id).cloned())
            .collect())
    }
}
