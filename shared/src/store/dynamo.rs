//! DynamoDB-backed store. One table per collection; table names come from
//! [`TableNames`]. Expected key schemas:
//!
//! - events, users, crews, games, messages, action-logs, gallery, chat: `id` (S)
//! - crew-games: `crewId` (S) partition, `gameId` (S) sort
//! - push-tokens: `userId` (S)
//! - slugs: `slug` (S), one guard item per live crew or event slug
//! - messages additionally carries a `crewId-index` GSI on `crewId`

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{
    AttributeValue, Delete, DeleteRequest, KeysAndAttributes, Put, PutRequest, TransactWriteItem, Update,
    WriteRequest,
};
use aws_sdk_dynamodb::Client;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::broadcast;

use super::{
    ActionLogStore, ChatStore, CrewStore, EventStore, GalleryStore, GameStore, MessageStore,
    PushTokenStore, StoreError, StoreResult, UserStore,
};
use crate::config::TableNames;
use crate::models::{
    now_str, ActionLog, ChatMessage, Crew, CrewGame, CrewStatus, Event, GalleryImage, Game,
    Message, PushToken, User,
};

/// DynamoDB caps a BatchWriteItem request at 25 items.
const BATCH_WRITE_LIMIT: usize = 25;
/// DynamoDB caps a BatchGetItem request at 100 keys.
const BATCH_GET_LIMIT: usize = 100;
const CHAT_CHANNEL_CAPACITY: usize = 256;
const CREW_SLUG: &str = "crew";
const EVENT_SLUG: &str = "event";

type Item = HashMap<String, AttributeValue>;

pub struct DynamoStore {
    client: Client,
    tables: TableNames,
    // Only carries messages written through this process.
    chat_feed: broadcast::Sender<ChatMessage>,
}

impl DynamoStore {
    pub async fn new(tables: TableNames) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        info!("Creating DynamoDB store with tables {:?}", tables);
        Self::with_client(Client::new(&config), tables)
    }

    pub fn with_client(client: Client, tables: TableNames) -> Self {
        let (chat_feed, _) = broadcast::channel(CHAT_CHANNEL_CAPACITY);
        Self {
            client,
            tables,
            chat_feed,
        }
    }

    async fn get_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        key: &str,
        id: &str,
        what: &str,
    ) -> StoreResult<T> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(key, AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(db_err)?;

        match output.item {
            Some(item) => Ok(serde_dynamo::from_item(item)?),
            None => Err(StoreError::NotFound(format!("{} {}", what, id))),
        }
    }

    async fn scan_all<T: DeserializeOwned>(&self, table: &str) -> StoreResult<Vec<T>> {
        let mut items: Vec<Item> = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(db_err)?;

            items.extend(output.items.unwrap_or_default());

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!("Scanned {} items from {}", items.len(), table);
        Ok(serde_dynamo::from_items(items)?)
    }

    async fn query_all<T: DeserializeOwned>(
        &self,
        table: &str,
        index: Option<&str>,
        attribute: &str,
        value: &str,
    ) -> StoreResult<Vec<T>> {
        let mut items: Vec<Item> = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(table)
                .set_index_name(index.map(str::to_string))
                .key_condition_expression("#k = :v")
                .expression_attribute_names("#k", attribute)
                .expression_attribute_values(":v", AttributeValue::S(value.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(db_err)?;

            items.extend(output.items.unwrap_or_default());

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(serde_dynamo::from_items(items)?)
    }

    /// Unconditional put.
    async fn put<T: Serialize>(&self, table: &str, record: &T) -> StoreResult<()> {
        let item: Item = serde_dynamo::to_item(record)?;
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Put that fails with `AlreadyExists` if `key` is already taken.
    async fn put_new<T: Serialize>(
        &self,
        table: &str,
        key: &str,
        record: &T,
        what: &str,
    ) -> StoreResult<()> {
        let item: Item = serde_dynamo::to_item(record)?;
        let result = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#k)")
            .expression_attribute_names("#k", key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(e)) if e.err().is_conditional_check_failed_exception() => {
                Err(StoreError::AlreadyExists(what.to_string()))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    /// Put that only succeeds while the stored `version` equals `expected`.
    async fn put_versioned<T: Serialize>(
        &self,
        table: &str,
        record: &T,
        expected: u64,
        what: &str,
    ) -> StoreResult<()> {
        let item: Item = serde_dynamo::to_item(record)?;
        let result = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .condition_expression("attribute_exists(id) AND #version = :expected")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":expected", AttributeValue::N(expected.to_string()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(e)) if e.err().is_conditional_check_failed_exception() => {
                Err(StoreError::ConditionFailed(format!(
                    "{} was modified concurrently",
                    what
                )))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    /// Put that fails with `NotFound` when the record does not exist yet.
    async fn put_existing<T: Serialize>(&self, table: &str, record: &T, what: &str) -> StoreResult<()> {
        let item: Item = serde_dynamo::to_item(record)?;
        let result = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .condition_expression("attribute_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(e)) if e.err().is_conditional_check_failed_exception() => {
                Err(StoreError::NotFound(what.to_string()))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    /// Transaction item creating the guard for `slug`; fails while another
    /// record holds it.
    fn claim_slug(&self, kind: &str, slug: &str, owner_id: &str) -> StoreResult<TransactWriteItem> {
        let put = Put::builder()
            .table_name(&self.tables.slugs)
            .item("slug", AttributeValue::S(slug_key(kind, slug)))
            .item("ownerId", AttributeValue::S(owner_id.to_string()))
            .condition_expression("attribute_not_exists(slug)")
            .build()
            .map_err(build_err)?;
        Ok(TransactWriteItem::builder().put(put).build())
    }

    fn release_slug(&self, kind: &str, slug: &str) -> StoreResult<TransactWriteItem> {
        let delete = Delete::builder()
            .table_name(&self.tables.slugs)
            .key("slug", AttributeValue::S(slug_key(kind, slug)))
            .build()
            .map_err(build_err)?;
        Ok(TransactWriteItem::builder().delete(delete).build())
    }

    fn put_new_item<T: Serialize>(&self, table: &str, record: &T) -> StoreResult<TransactWriteItem> {
        let put = Put::builder()
            .table_name(table)
            .set_item(Some(serde_dynamo::to_item(record)?))
            .condition_expression("attribute_not_exists(id)")
            .build()
            .map_err(build_err)?;
        Ok(TransactWriteItem::builder().put(put).build())
    }

    fn put_versioned_item<T: Serialize>(
        &self,
        table: &str,
        record: &T,
        expected: u64,
    ) -> StoreResult<TransactWriteItem> {
        let put = Put::builder()
            .table_name(table)
            .set_item(Some(serde_dynamo::to_item(record)?))
            .condition_expression("attribute_exists(id) AND #version = :expected")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":expected", AttributeValue::N(expected.to_string()))
            .build()
            .map_err(build_err)?;
        Ok(TransactWriteItem::builder().put(put).build())
    }

    /// Runs `items` as one transaction. A failed condition on item `i` is
    /// reported as `on_conflict(i)`.
    async fn transact<F>(&self, items: Vec<TransactWriteItem>, on_conflict: F) -> StoreResult<()>
    where
        F: Fn(usize) -> StoreError + Send,
    {
        let result = self
            .client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(e)) => {
                if let TransactWriteItemsError::TransactionCanceledException(cancelled) = e.err() {
                    let failed = cancelled
                        .cancellation_reasons()
                        .iter()
                        .position(|r| r.code() == Some("ConditionalCheckFailed"));
                    if let Some(index) = failed {
                        return Err(on_conflict(index));
                    }
                }
                Err(StoreError::Database(format!("{:?}", e.err())))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn batch_write(&self, table: &str, requests: Vec<WriteRequest>) -> StoreResult<()> {
        for chunk in requests.chunks(BATCH_WRITE_LIMIT) {
            let output = self
                .client
                .batch_write_item()
                .request_items(table, chunk.to_vec())
                .send()
                .await
                .map_err(db_err)?;

            let unprocessed = output
                .unprocessed_items
                .as_ref()
                .and_then(|items| items.get(table))
                .map_or(0, Vec::len);
            if unprocessed > 0 {
                warn!("{} items left unprocessed in batch write to {}", unprocessed, table);
                return Err(StoreError::Database(format!(
                    "{} items were not processed by {}",
                    unprocessed, table
                )));
            }
        }
        Ok(())
    }
}

fn db_err<E: std::fmt::Display>(e: E) -> StoreError {
    error!("DynamoDB request failed: {}", e);
    StoreError::Database(e.to_string())
}

fn slug_key(kind: &str, slug: &str) -> String {
    format!("{}#{}", kind, slug)
}

fn build_err<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Database(format!("Failed to build request: {}", e))
}

#[async_trait]
impl EventStore for DynamoStore {
    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self.scan_all(&self.tables.events).await?;
        events.sort_by(|a, b| a.starts_at().cmp(&b.starts_at()).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn get_event(&self, id: &str) -> StoreResult<Event> {
        self.get_by_id(&self.tables.events, "id", id, "Event").await
    }

    async fn get_event_by_slug(&self, slug: &str) -> StoreResult<Event> {
        let events: Vec<Event> = self.scan_all(&self.tables.events).await?;
        events
            .into_iter()
            .find(|e| e.slug == slug)
            .ok_or_else(|| StoreError::NotFound(format!("Event with slug {}", slug)))
    }

    async fn create_event(&self, event: Event) -> StoreResult<Event> {
        let items = vec![
            self.claim_slug(EVENT_SLUG, &event.slug, &event.id)?,
            self.put_new_item(&self.tables.events, &event)?,
        ];
        self.transact(items, |index| match index {
            0 => StoreError::AlreadyExists(format!("An event with slug {}", event.slug)),
            _ => StoreError::AlreadyExists(format!("Event {}", event.id)),
        })
        .await?;
        Ok(event)
    }

    async fn update_event(&self, mut event: Event) -> StoreResult<Event> {
        let stored = self.get_event(&event.id).await?;
        let expected = event.version;
        if stored.version != expected {
            return Err(StoreError::ConditionFailed(format!(
                "Event {} was modified concurrently",
                event.id
            )));
        }

        event.version += 1;
        event.updated_at = now_str();

        if stored.slug == event.slug {
            self.put_versioned(
                &self.tables.events,
                &event,
                expected,
                &format!("Event {}", event.id),
            )
            .await?;
            return Ok(event);
        }

        let items = vec![
            self.claim_slug(EVENT_SLUG, &event.slug, &event.id)?,
            self.release_slug(EVENT_SLUG, &stored.slug)?,
            self.put_versioned_item(&self.tables.events, &event, expected)?,
        ];
        self.transact(items, |index| match index {
            0 => StoreError::AlreadyExists(format!("An event with slug {}", event.slug)),
            _ => StoreError::ConditionFailed(format!("Event {} was modified concurrently", event.id)),
        })
        .await?;
        Ok(event)
    }
}

#[async_trait]
impl UserStore for DynamoStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.scan_all(&self.tables.users).await?;
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
        self.get_by_id(&self.tables.users, "id", id, "User").await
    }

    async fn create_user(&self, user: User) -> StoreResult<User> {
        self.put_new(&self.tables.users, "id", &user, &format!("User {}", user.id))
            .await?;
        Ok(user)
    }

    async fn update_user(&self, mut user: User) -> StoreResult<User> {
        user.updated_at = now_str();
        self.put_existing(&self.tables.users, &user, &format!("User {}", user.id))
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl CrewStore for DynamoStore {
    async fn list_crews(&self, status: Option<CrewStatus>) -> StoreResult<Vec<Crew>> {
        let mut crews: Vec<Crew> = self.scan_all(&self.tables.crews).await?;
        crews.retain(|c| status.map_or(true, |s| c.status == s));
        crews.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(crews)
    }

    async fn get_crew(&self, id: &str) -> StoreResult<Crew> {
        self.get_by_id(&self.tables.crews, "id", id, "Crew").await
    }

    async fn get_crew_by_slug(&self, slug: &str) -> StoreResult<Crew> {
        let crews: Vec<Crew> = self.scan_all(&self.tables.crews).await?;
        crews
            .into_iter()
            .find(|c| c.slug == slug && c.status != CrewStatus::Deleted)
            .ok_or_else(|| StoreError::NotFound(format!("Crew with slug {}", slug)))
    }

    async fn create_crew(&self, crew: Crew) -> StoreResult<Crew> {
        let items = vec![
            self.claim_slug(CREW_SLUG, &crew.slug, &crew.id)?,
            self.put_new_item(&self.tables.crews, &crew)?,
        ];
        self.transact(items, |index| match index {
            0 => StoreError::AlreadyExists(format!("A crew with slug {}", crew.slug)),
            _ => StoreError::AlreadyExists(format!("Crew {}", crew.id)),
        })
        .await?;
        Ok(crew)
    }

    async fn update_crew(&self, mut crew: Crew) -> StoreResult<Crew> {
        let stored = self.get_crew(&crew.id).await?;
        let expected = crew.version;
        if stored.version != expected {
            return Err(StoreError::ConditionFailed(format!(
                "Crew {} was modified concurrently",
                crew.id
            )));
        }

        crew.version += 1;
        crew.updated_at = now_str();

        if stored.slug == crew.slug {
            self.put_versioned(
                &self.tables.crews,
                &crew,
                expected,
                &format!("Crew {}", crew.id),
            )
            .await?;
            return Ok(crew);
        }

        let items = vec![
            self.claim_slug(CREW_SLUG, &crew.slug, &crew.id)?,
            self.release_slug(CREW_SLUG, &stored.slug)?,
            self.put_versioned_item(&self.tables.crews, &crew, expected)?,
        ];
        self.transact(items, |index| match index {
            0 => StoreError::AlreadyExists(format!("A crew with slug {}", crew.slug)),
            _ => StoreError::ConditionFailed(format!("Crew {} was modified concurrently", crew.id)),
        })
        .await?;
        Ok(crew)
    }

    async fn transition_crew_status(
        &self,
        crew_id: &str,
        expected: CrewStatus,
        next: CrewStatus,
        message: Option<Message>,
    ) -> StoreResult<Crew> {
        // Surface a missing crew as NotFound rather than a failed condition
        let current = self.get_crew(crew_id).await?;

        let update = Update::builder()
            .table_name(&self.tables.crews)
            .key("id", AttributeValue::S(crew_id.to_string()))
            .update_expression(
                "SET #status = :next, #version = #version + :one, #updatedAt = :now",
            )
            .condition_expression("attribute_exists(id) AND #status = :expected")
            .expression_attribute_names("#status", "status")
            .expression_attribute_names("#version", "version")
            .expression_attribute_names("#updatedAt", "updatedAt")
            .expression_attribute_values(":next", AttributeValue::S(next.as_str().to_string()))
            .expression_attribute_values(
                ":expected",
                AttributeValue::S(expected.as_str().to_string()),
            )
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .expression_attribute_values(":now", AttributeValue::S(now_str()))
            .build()
            .map_err(build_err)?;

        let mut items = vec![TransactWriteItem::builder().update(update).build()];

        if let Some(message) = &message {
            let put = Put::builder()
                .table_name(&self.tables.messages)
                .set_item(Some(serde_dynamo::to_item(message)?))
                .build()
                .map_err(build_err)?;
            items.push(TransactWriteItem::builder().put(put).build());
        }

        // A withdrawn crew gives its slug back
        if next == CrewStatus::Deleted {
            items.push(self.release_slug(CREW_SLUG, &current.slug)?);
        }

        self.transact(items, |_| {
            StoreError::ConditionFailed(format!("Crew {} is no longer {}", crew_id, expected))
        })
        .await?;

        self.get_crew(crew_id).await
    }

    async fn list_crew_games(&self, crew_id: &str) -> StoreResult<Vec<CrewGame>> {
        let mut games: Vec<CrewGame> = self
            .query_all(&self.tables.crew_games, None, "crewId", crew_id)
            .await?;
        games.sort_by(|a, b| a.date.cmp(&b.date).then(a.game_id.cmp(&b.game_id)));
        Ok(games)
    }

    async fn put_crew_games(&self, games: Vec<CrewGame>) -> StoreResult<()> {
        let mut requests = Vec::with_capacity(games.len());
        for game in &games {
            let item: Item = serde_dynamo::to_item(game)?;
            let put = PutRequest::builder()
                .set_item(Some(item))
                .build()
                .map_err(build_err)?;
            requests.push(WriteRequest::builder().put_request(put).build());
        }
        self.batch_write(&self.tables.crew_games, requests).await
    }

    async fn list_all_crew_games(&self) -> StoreResult<Vec<CrewGame>> {
        self.scan_all(&self.tables.crew_games).await
    }
}

#[async_trait]
impl GameStore for DynamoStore {
    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        let mut games: Vec<Game> = self.scan_all(&self.tables.games).await?;
        games.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(games)
    }

    async fn get_game(&self, id: &str) -> StoreResult<Game> {
        self.get_by_id(&self.tables.games, "id", id, "Game").await
    }

    async fn create_game(&self, game: Game) -> StoreResult<Game> {
        self.put_new(&self.tables.games, "id", &game, &format!("Game {}", game.id))
            .await?;
        Ok(game)
    }

    async fn update_game(&self, mut game: Game) -> StoreResult<Game> {
        game.updated_at = now_str();
        self.put_existing(&self.tables.games, &game, &format!("Game {}", game.id))
            .await?;
        Ok(game)
    }
}

#[async_trait]
impl MessageStore for DynamoStore {
    async fn list_messages(&self, crew_id: &str) -> StoreResult<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .query_all(&self.tables.messages, Some("crewId-index"), "crewId", crew_id)
            .await?;
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn create_message(&self, message: Message) -> StoreResult<Message> {
        self.put(&self.tables.messages, &message).await?;
        Ok(message)
    }

    async fn delete_messages(&self, ids: &[String]) -> StoreResult<()> {
        let mut requests = Vec::with_capacity(ids.len());
        for id in ids {
            let delete = DeleteRequest::builder()
                .key("id", AttributeValue::S(id.clone()))
                .build()
                .map_err(build_err)?;
            requests.push(WriteRequest::builder().delete_request(delete).build());
        }
        self.batch_write(&self.tables.messages, requests).await
    }
}

#[async_trait]
impl ActionLogStore for DynamoStore {
    async fn append_log(&self, log: ActionLog) -> StoreResult<()> {
        self.put(&self.tables.action_logs, &log).await
    }

    async fn recent_logs(&self, limit: usize) -> StoreResult<Vec<ActionLog>> {
        let mut logs: Vec<ActionLog> = self.scan_all(&self.tables.action_logs).await?;
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        logs.truncate(limit);
        Ok(logs)
    }
}

#[async_trait]
impl GalleryStore for DynamoStore {
    async fn list_images(&self) -> StoreResult<Vec<GalleryImage>> {
        let mut images: Vec<GalleryImage> = self.scan_all(&self.tables.gallery).await?;
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(images)
    }

    async fn create_image(&self, image: GalleryImage) -> StoreResult<GalleryImage> {
        self.put(&self.tables.gallery, &image).await?;
        Ok(image)
    }

    async fn delete_image(&self, id: &str) -> StoreResult<()> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.tables.gallery)
            .key("id", AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(e)) if e.err().is_conditional_check_failed_exception() => {
                Err(StoreError::NotFound(format!("Image {}", id)))
            }
            Err(e) => Err(db_err(e)),
        }
    }
}

#[async_trait]
impl ChatStore for DynamoStore {
    async fn list_chat_messages(&self, conversation_id: &str) -> StoreResult<Vec<ChatMessage>> {
        let mut messages: Vec<ChatMessage> = self.scan_all(&self.tables.chat).await?;
        messages.retain(|m| m.conversation_id == conversation_id);
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn create_chat_message(&self, message: ChatMessage) -> StoreResult<ChatMessage> {
        self.put(&self.tables.chat, &message).await?;
        let _ = self.chat_feed.send(message.clone());
        Ok(message)
    }

    async fn list_conversations(&self) -> StoreResult<Vec<String>> {
        let messages: Vec<ChatMessage> = self.scan_all(&self.tables.chat).await?;
        let mut ids: Vec<String> = messages.into_iter().map(|m| m.conversation_id).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.chat_feed.subscribe()
    }
}

#[async_trait]
impl PushTokenStore for DynamoStore {
    async fn save_push_token(&self, token: PushToken) -> StoreResult<()> {
        self.put(&self.tables.push_tokens, &token).await
    }

    async fn get_push_tokens(&self, user_ids: &[String]) -> StoreResult<Vec<PushToken>> {
        let mut tokens = Vec::new();

        for chunk in user_ids.chunks(BATCH_GET_LIMIT) {
            let keys: Vec<Item> = chunk
                .iter()
                .map(|id| HashMap::from([("userId".to_string(), AttributeValue::S(id.clone()))]))
                .collect();

            let keys_and_attributes = KeysAndAttributes::builder()
                .set_keys(Some(keys))
                .build()
                .map_err(build_err)?;

            let output = self
                .client
                .batch_get_item()
                .request_items(&self.tables.push_tokens, keys_and_attributes)
                .send()
                .await
                .map_err(db_err)?;

            let items = output
                .responses
                .and_then(|mut responses| responses.remove(&self.tables.push_tokens))
                .unwrap_or_default();
            let mut found: Vec<PushToken> = serde_dynamo::from_items(items)?;
            tokens.append(&mut found);
        }

        Ok(tokens)
    }
}
