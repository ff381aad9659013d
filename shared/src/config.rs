use log::warn;
use std::env;

/// Which store implementation a service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Dynamo,
    Memory,
}

/// DynamoDB table names, one per collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub events: String,
    pub users: String,
    pub crews: String,
    pub crew_games: String,
    pub games: String,
    pub messages: String,
    pub action_logs: String,
    pub gallery: String,
    pub chat: String,
    pub push_tokens: String,
    /// Guard items that keep crew and event slugs unique.
    pub slugs: String,
}

impl TableNames {
    pub fn from_env() -> Self {
        Self {
            events: table("EVENTS_TABLE", "events"),
            users: table("USERS_TABLE", "users"),
            crews: table("CREWS_TABLE", "crews"),
            crew_games: table("CREW_GAMES_TABLE", "crew-games"),
            games: table("GAMES_TABLE", "games"),
            messages: table("MESSAGES_TABLE", "messages"),
            action_logs: table("ACTION_LOGS_TABLE", "action-logs"),
            gallery: table("GALLERY_TABLE", "gallery"),
            chat: table("CHAT_TABLE", "chat"),
            push_tokens: table("PUSH_TOKENS_TABLE", "push-tokens"),
            slugs: table("SLUGS_TABLE", "slugs"),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self::from_env()
    }
}

fn table(key: &str, name: &str) -> String {
    env::var(key).unwrap_or_else(|_| format!("pena-{}", name))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Prefix every API route is nested under ("/Prod" behind API Gateway).
    pub api_prefix: String,
    pub store_backend: StoreBackend,
    pub tables: TableNames,
    /// Topic crew status changes are published to.
    pub sns_topic_arn: Option<String>,
    /// HS256 secret bearer tokens are verified with.
    pub jwt_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Invalid PORT '{}', falling back to 3000", raw);
                3000
            }),
            Err(_) => 3000,
        };

        let remove_base_path = env::var("REMOVE_BASE_PATH")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("dynamo") | Err(_) => StoreBackend::Dynamo,
            Ok(other) => {
                warn!("Unknown STORE_BACKEND '{}', using dynamo", other);
                StoreBackend::Dynamo
            }
        };

        Self {
            port,
            api_prefix: if remove_base_path { String::new() } else { "/Prod".to_string() },
            store_backend,
            tables: TableNames::from_env(),
            sns_topic_arn: env::var("SNS_TOPIC_ARN").ok().filter(|s| !s.is_empty()),
            jwt_secret: env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
        }
    }
}
