use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;

use nudge_core::dispatcher::Dispatcher;

use crate::state::AppState;

/// Header the external scheduler puts the shared secret in.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// POST /api/cron/reminders — authenticated trigger for one reminder pass.
///
/// Assumes at-least-once invocation by an external scheduler; idempotency
/// across repeated triggers comes from the dedup ledger, not from any
/// request-level bookkeeping. Completion is 200 even when individual
/// dispatches failed — the summary carries the partial failures.
pub async fn trigger_reminders(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<serde_json::Value>) {
    // Fail closed: without a configured secret no caller can be trusted.
    let expected = match app.config.cron_secret.as_deref() {
        Some(secret) if !secret.is_empty() => secret.to_string(),
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": "cron secret is not configured",
                })),
            );
        }
    };

    match provided_secret(&headers) {
        Some(provided) if provided == expected => {}
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "success": false,
                    "message": "invalid or missing cron secret",
                })),
            );
        }
    }

    let Ok(_guard) = app.run_lock.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "success": false,
                "message": "a reminder run is already in progress",
            })),
        );
    };

    let store = app.store.clone();
    let notifier = app.notifier.clone();
    let threshold = app.config.stall_threshold();
    let result = tokio::task::spawn_blocking(move || {
        let dispatcher = Dispatcher::new(store.as_ref(), notifier.as_ref(), threshold);
        dispatcher.run(chrono::Utc::now())
    })
    .await;

    match result {
        Ok(Ok(summary)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "summary": summary,
            })),
        ),
        Ok(Err(err)) => {
            tracing::error!(%err, "reminder run aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "message": err.to_string(),
                })),
            )
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "message": format!("task join error: {err}"),
            })),
        ),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The secret offered by the caller: `x-cron-secret`, or a bearer
/// authorization header as fallback.
fn provided_secret(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        return Some(value);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
