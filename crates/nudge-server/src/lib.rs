pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use nudge_core::config::WarnLevel;
pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        // Cron trigger
        .route("/api/cron/reminders", post(routes::cron::trigger_reminders))
        // Settings (opt-in toggle write path)
        .route(
            "/api/users/{user_id}/reminder-settings",
            get(routes::settings::get_settings),
        )
        .route(
            "/api/users/{user_id}/reminder-settings",
            put(routes::settings::put_settings),
        )
        // Progress ingest
        .route(
            "/api/users/{user_id}/progress",
            post(routes::progress::record_progress),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the nudge API server.
///
/// Config problems are surfaced once at startup; a missing cron secret also
/// makes the trigger endpoint fail closed on every call.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    for warning in state.config.validate() {
        match warning.level {
            WarnLevel::Error => tracing::error!("config: {}", warning.message),
            WarnLevel::Warning => tracing::warn!("config: {}", warning.message),
        }
    }

    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("nudge server listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
