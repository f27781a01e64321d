use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use nudge_core::store::ReminderStore;
use nudge_core::types::{validate_user_id, ActivityRecord};
use nudge_core::NudgeError;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProgressRequest {
    /// Event time; defaults to now. Progress events can arrive late, so the
    /// store keeps whichever timestamp is newest.
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

/// POST /api/users/:user_id/progress — course-progress ingest.
///
/// Returns the stored activity record, which may be newer than the event
/// just posted.
pub async fn record_progress(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
    body: Option<Json<ProgressRequest>>,
) -> Result<Json<ActivityRecord>, AppError> {
    let at = body.and_then(|Json(b)| b.at).unwrap_or_else(Utc::now);
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        validate_user_id(&user_id)?;
        store.record_progress(&ActivityRecord {
            user_id: user_id.clone(),
            last_progress_at: at,
        })?;
        store
            .activity(&user_id)?
            .ok_or(NudgeError::UserNotFound(user_id))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
