use anyhow::Context;
use chrono::{DateTime, Utc};
use std::path::Path;

use nudge_core::config::Config;
use nudge_core::paths;
use nudge_core::store::{RedbStore, ReminderStore};
use nudge_core::types::{validate_user_id, ActivityRecord};
use nudge_core::NudgeError;

use crate::output::print_json;

pub fn run(
    root: &Path,
    user_id: &str,
    at: Option<DateTime<Utc>>,
    json: bool,
) -> anyhow::Result<()> {
    Config::load(root).context("failed to load config")?;
    validate_user_id(user_id)?;

    let store = RedbStore::open(&paths::db_path(root))?;
    store.record_progress(&ActivityRecord {
        user_id: user_id.to_string(),
        last_progress_at: at.unwrap_or_else(Utc::now),
    })?;

    let stored = store
        .activity(user_id)?
        .ok_or(NudgeError::UserNotFound(user_id.to_string()))?;

    if json {
        print_json(&stored)?;
    } else {
        println!(
            "progress for {} recorded at {}",
            stored.user_id,
            stored.last_progress_at.to_rfc3339()
        );
    }
    Ok(())
}
