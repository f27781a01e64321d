use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use nudge_core::store::ReminderStore;
use nudge_core::types::{validate_user_id, ReminderSettings};
use nudge_core::NudgeError;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/users/:user_id/reminder-settings — current opt-in state.
pub async fn get_settings(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ReminderSettings>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        store
            .settings(&user_id)?
            .ok_or(NudgeError::UserNotFound(user_id))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub email: String,
    pub opted_in: bool,
}

/// PUT /api/users/:user_id/reminder-settings — the opt-in toggle write path.
///
/// Stamps `last_opt_in_at` only on an opt-in transition and always refreshes
/// `updated_at`; the transition logic lives in
/// [`ReminderSettings::apply_change`].
pub async fn put_settings(
    State(app): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<ReminderSettings>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        validate_user_id(&user_id)?;
        let previous = store.settings(&user_id)?;
        let settings = ReminderSettings::apply_change(
            previous.as_ref(),
            &user_id,
            &request.email,
            request.opted_in,
            chrono::Utc::now(),
        );
        store.upsert_settings(&settings)?;
        Ok::<_, NudgeError>(settings)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
