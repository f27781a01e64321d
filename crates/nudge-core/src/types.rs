use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NudgeError, Result};

// ---------------------------------------------------------------------------
// User id validation
// ---------------------------------------------------------------------------

/// User ids are lowercase alphanumeric with interior hyphens, max 64 chars.
pub fn validate_user_id(id: &str) -> Result<()> {
    let well_formed = !id.is_empty()
        && id.len() <= 64
        && !id.starts_with('-')
        && !id.ends_with('-')
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        return Err(NudgeError::InvalidUserId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ReminderSettings
// ---------------------------------------------------------------------------

/// Per-user reminder opt-in state.
///
/// Written only through [`ReminderSettings::apply_change`] so that
/// `last_opt_in_at` is stamped exactly on opt-in transitions. The reminder
/// engine reads these records but never writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub user_id: String,
    /// Contact identity handed to the notifier. Lives here because the
    /// account/profile store is an external system.
    pub email: String,
    pub opted_in: bool,
    /// Stamped when `opted_in` transitions false→true or unset→true.
    /// Doubles as the episode anchor for learners with no recorded activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opt_in_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ReminderSettings {
    /// Compute the stored record for a settings mutation.
    ///
    /// `last_opt_in_at` carries over unless this change is an opt-in
    /// transition, in which case it is stamped with `now`. `updated_at` is
    /// always refreshed.
    pub fn apply_change(
        previous: Option<&ReminderSettings>,
        user_id: &str,
        email: &str,
        opted_in: bool,
        now: DateTime<Utc>,
    ) -> ReminderSettings {
        let was_opted_in = previous.map(|p| p.opted_in).unwrap_or(false);
        let last_opt_in_at = if opted_in && !was_opted_in {
            Some(now)
        } else {
            previous.and_then(|p| p.last_opt_in_at)
        };
        ReminderSettings {
            user_id: user_id.to_string(),
            email: email.to_string(),
            opted_in,
            last_opt_in_at,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// ActivityRecord
// ---------------------------------------------------------------------------

/// Most recent learning activity for a user, reported by the course-progress
/// subsystem. Absence of a record means the learner was never active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub user_id: String,
    pub last_progress_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// DedupRecord
// ---------------------------------------------------------------------------

/// Ledger entry preventing duplicate dispatch for the same inactivity episode.
///
/// `episode_anchor` is the activity timestamp the reminder was sent for; a
/// learner who resumes and stalls again gets a new anchor and is due exactly
/// one further reminder. Records are created on first dispatch, overwritten on
/// later dispatches, and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupRecord {
    pub user_id: String,
    pub last_reminder_sent_at: DateTime<Utc>,
    pub episode_anchor: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// A single per-user dispatch failure, recovered locally during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchFailure {
    pub user_id: String,
    pub reason: String,
}

/// Outcome of one dispatcher pass. Ephemeral: returned to the trigger and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub users_evaluated: u32,
    pub users_reminded: u32,
    pub users_skipped: u32,
    /// Per-user failures in evaluation order.
    pub failures: Vec<DispatchFailure>,
}

impl RunSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            users_evaluated: 0,
            users_reminded: 0,
            users_skipped: 0,
            failures: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
