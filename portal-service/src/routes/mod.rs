use axum::{
    extract::Request,
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use log::{info, warn};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{
    admin_handlers::{get_dashboard, get_logs},
    chat_handlers::{
        get_conversation, get_my_messages, list_conversations, post_my_message,
        post_staff_message, stream_conversation, stream_my_messages,
    },
    crew_handlers::{
        approve_crew, get_crew, get_crew_by_slug, get_crew_games, get_crew_messages,
        get_my_crews, list_active_crews, list_crews_admin, modify_crew, register_crew,
        reject_crew, update_crew_game, withdraw_crew,
    },
    event_handlers::{
        create_event, get_calendar, get_event, get_event_by_slug, join_event, leave_event,
        list_events, update_event,
    },
    gallery_handlers::{create_image, delete_image, list_all_images, list_public_images},
    game_handlers::{create_game, get_ranking, list_games, update_game},
    user_handlers::{
        get_me, get_user, list_staff, list_users, register_push_token, register_user, update_me,
        update_user_role,
    },
};
use crate::notifications::set_topic_arn;
use pena_shared::auth::{auth_middleware, JwtSecret};
use pena_shared::config::{Config, StoreBackend};
use pena_shared::store::{dynamo::DynamoStore, memory::MemoryStore, PortalStore};

/// Creates a router backed by the store selected in `config`
pub async fn create_router(config: &Config) -> Router {
    info!("Using API route prefix: '{}'", config.api_prefix);

    if let Some(arn) = &config.sns_topic_arn {
        set_topic_arn(arn);
    }
    let jwt_secret = JwtSecret::new(config.jwt_secret.clone());
    if !jwt_secret.is_configured() {
        warn!("JWT_SECRET is not set; every private route will answer 500");
    }

    match config.store_backend {
        StoreBackend::Dynamo => {
            info!("Creating router with DynamoDB store");
            let store = Arc::new(DynamoStore::new(config.tables.clone()).await);
            create_router_with_store(store, &config.api_prefix, jwt_secret)
        }
        StoreBackend::Memory => {
            warn!("Creating router with in-memory store; data is lost on restart");
            create_router_with_store(Arc::new(MemoryStore::new()), &config.api_prefix, jwt_secret)
        }
    }
}

// Logging middleware to trace all requests
async fn logging_middleware(
    req: Request,
    next: axum::middleware::Next,
) -> impl axum::response::IntoResponse {
    info!(
        "Router received request: method={}, uri={}",
        req.method(),
        req.uri()
    );
    next.run(req).await
}

/// Creates a router with a given store implementation
pub fn create_router_with_store<S>(store: Arc<S>, prefix: &str, jwt_secret: JwtSecret) -> Router
where
    S: PortalStore + 'static,
{
    info!("Setting up API routes with prefix: '{}'", prefix);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Visitors can browse without signing in
    let public_routes = Router::new()
        .route("/events", get(list_events::<S>))
        .route("/events/by-slug/:slug", get(get_event_by_slug::<S>))
        .route("/events/:id", get(get_event::<S>))
        .route("/calendar", get(get_calendar::<S>))
        .route("/crews", get(list_active_crews::<S>))
        .route("/crews/by-slug/:slug", get(get_crew_by_slug::<S>))
        .route("/crews/:id/games", get(get_crew_games::<S>))
        .route("/games", get(list_games::<S>))
        .route("/ranking", get(get_ranking::<S>))
        .route("/gallery", get(list_public_images::<S>))
        .route("/staff", get(list_staff::<S>));

    let private_routes = Router::new()
        // Users
        .route("/users/register", post(register_user::<S>))
        .route("/users/me", get(get_me::<S>).patch(update_me::<S>))
        .route("/users/push-token", put(register_push_token::<S>))
        .route("/users", get(list_users::<S>))
        .route("/users/:id", get(get_user::<S>))
        .route("/users/:id/role", patch(update_user_role::<S>))
        // Events
        .route("/events", post(create_event::<S>))
        .route("/events/:id", patch(update_event::<S>))
        .route(
            "/events/:id/participants",
            post(join_event::<S>).delete(leave_event::<S>),
        )
        // Crews
        .route("/crews", post(register_crew::<S>))
        .route("/crews/mine", get(get_my_crews::<S>))
        .route(
            "/crews/:id",
            get(get_crew::<S>)
                .patch(modify_crew::<S>)
                .delete(withdraw_crew::<S>),
        )
        .route("/crews/:id/messages", get(get_crew_messages::<S>))
        .route("/admin/crews", get(list_crews_admin::<S>))
        .route("/admin/crews/:id/approve", post(approve_crew::<S>))
        .route("/admin/crews/:id/reject", post(reject_crew::<S>))
        .route(
            "/admin/crews/:id/games/:game_id",
            patch(update_crew_game::<S>),
        )
        // Games
        .route("/games", post(create_game::<S>))
        .route("/games/:id", patch(update_game::<S>))
        // Gallery
        .route("/gallery", post(create_image::<S>))
        .route("/gallery/:id", axum::routing::delete(delete_image::<S>))
        .route("/admin/gallery", get(list_all_images::<S>))
        // Support chat
        .route(
            "/support/messages",
            get(get_my_messages::<S>).post(post_my_message::<S>),
        )
        .route("/support/stream", get(stream_my_messages::<S>))
        .route("/support/conversations", get(list_conversations::<S>))
        .route(
            "/support/conversations/:user_id/messages",
            get(get_conversation::<S>).post(post_staff_message::<S>),
        )
        .route(
            "/support/conversations/:user_id/stream",
            get(stream_conversation::<S>),
        )
        // Admin
        .route("/admin/dashboard", get(get_dashboard::<S>))
        .route("/admin/logs", get(get_logs::<S>))
        .route_layer(middleware::from_fn_with_state(jwt_secret, auth_middleware));

    let api_routes = public_routes.merge(private_routes).with_state(store);

    let router = if prefix.is_empty() {
        // For tests or when no prefix is needed, don't nest the routes
        api_routes
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    } else {
        Router::new()
            .nest(prefix, api_routes)
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    };

    info!(
        "Router configured with all routes and middleware under prefix: '{}'",
        prefix
    );

    router.fallback(|req: Request| async move {
        warn!("No route matched for: {} {}", req.method(), req.uri());
        (
            axum::http::StatusCode::NOT_FOUND,
            "The requested resource was not found".to_string(),
        )
    })
}
