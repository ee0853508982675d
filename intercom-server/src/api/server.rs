//! HTTP server setup and routing

use crate::config::Config;
use crate::device::DeviceTrigger;
use crate::error::{Error, Result};
use crate::playback::CommandQueue;
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::{Pool, Sqlite};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: Pool<Sqlite>,
    /// Producer side of the dispatcher's queue
    pub queue: CommandQueue,
    pub trigger: Arc<dyn DeviceTrigger>,
    pub state: Arc<SharedState>,
}

/// Build the router with every endpoint attached
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Devices and groups
        .route(
            "/intercoms",
            get(handlers::catalog::list_intercoms).post(handlers::catalog::create_intercom),
        )
        .route("/intercoms/status", get(handlers::catalog::intercom_status))
        .route(
            "/intercoms/:id",
            get(handlers::catalog::get_intercom)
                .put(handlers::catalog::update_intercom)
                .delete(handlers::catalog::delete_intercom),
        )
        .route(
            "/groups",
            get(handlers::catalog::list_groups).post(handlers::catalog::create_group),
        )
        .route(
            "/groups/:id",
            get(handlers::catalog::get_group)
                .put(handlers::catalog::update_group)
                .delete(handlers::catalog::delete_group),
        )
        // Sounds and announcements
        .route(
            "/sounds",
            get(handlers::catalog::list_sounds).post(handlers::catalog::create_sound),
        )
        .route("/sounds/:id", get(handlers::catalog::get_sound))
        .route(
            "/announcements",
            get(handlers::catalog::list_announcements).post(handlers::catalog::create_announcement),
        )
        .route(
            "/announcements/:id",
            get(handlers::catalog::get_announcement)
                .put(handlers::catalog::update_announcement)
                .delete(handlers::catalog::delete_announcement),
        )
        // Pending commands and stop operations
        .route(
            "/commands",
            get(handlers::commands::list_commands).post(handlers::commands::create_command),
        )
        .route("/commands/stopall", post(handlers::commands::stop_all))
        .route("/commands/stopall_full", post(handlers::commands::stop_all_full))
        .route(
            "/commands/:id",
            get(handlers::commands::get_command).delete(handlers::commands::delete_command),
        )
        // Saved templates and sets
        .route(
            "/saved_commands",
            get(handlers::saved::list_saved_commands).post(handlers::saved::create_saved_command),
        )
        .route(
            "/saved_commands/:id",
            get(handlers::saved::get_saved_command)
                .put(handlers::saved::update_saved_command)
                .delete(handlers::saved::delete_saved_command),
        )
        .route(
            "/saved_commands/:id/trigger",
            post(handlers::saved::trigger_saved_command),
        )
        .route(
            "/saved_command_sets",
            get(handlers::saved::list_command_sets).post(handlers::saved::create_command_set),
        )
        .route(
            "/saved_command_sets/:id",
            get(handlers::saved::get_command_set)
                .put(handlers::saved::update_command_set)
                .delete(handlers::saved::delete_command_set),
        )
        .route(
            "/saved_command_sets/:id/trigger",
            post(handlers::saved::trigger_command_set),
        )
        // Dispatcher observation
        .route("/dispatch/status", get(handlers::dispatch_status))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` resolves
pub async fn run<F>(config: &Config, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(ctx);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
