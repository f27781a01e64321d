//! One reminder pass over every opted-in learner.
//!
//! The dispatcher owns the run-level correctness properties: partial-failure
//! isolation (one learner's notifier fault never aborts the pass) and ledger
//! recording (a dedup row is written only after a confirmed send, so a failed
//! dispatch is retried automatically on the next scheduled pass).

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::classifier::{classify, Outcome, StallContext};
use crate::error::Result;
use crate::notify::{reminder_email, Notifier};
use crate::store::ReminderStore;
use crate::types::{DedupRecord, DispatchFailure, RunSummary};

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher<'a> {
    store: &'a dyn ReminderStore,
    notifier: &'a dyn Notifier,
    threshold: Duration,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        store: &'a dyn ReminderStore,
        notifier: &'a dyn Notifier,
        threshold: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            threshold,
        }
    }

    /// Execute one full pass and return its summary.
    ///
    /// Store faults abort the run and propagate; notifier faults are recorded
    /// per user and the pass continues. Users are processed in store order,
    /// which callers must not rely on.
    pub fn run(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let users = self.store.opted_in_users()?;
        tracing::debug!(%run_id, users = users.len(), "starting reminder pass");

        let mut summary = RunSummary::new(run_id);
        for settings in &users {
            summary.users_evaluated += 1;

            // Opted-out rows are settled without touching activity or dedup.
            let outcome = if !settings.opted_in {
                Outcome::NotOptedIn
            } else {
                let activity = self.store.activity(&settings.user_id)?;
                let dedup = self.store.dedup(&settings.user_id)?;
                classify(&StallContext {
                    now,
                    settings,
                    activity: activity.as_ref(),
                    dedup: dedup.as_ref(),
                    threshold: self.threshold,
                })
            };

            match outcome {
                Outcome::Eligible { anchor } => {
                    match self.notifier.send(&reminder_email(settings)) {
                        Ok(()) => {
                            self.store.upsert_dedup(&DedupRecord {
                                user_id: settings.user_id.clone(),
                                last_reminder_sent_at: now,
                                episode_anchor: anchor,
                            })?;
                            summary.users_reminded += 1;
                            tracing::debug!(%run_id, user = %settings.user_id, "reminder sent");
                        }
                        Err(err) => {
                            tracing::warn!(
                                %run_id,
                                user = %settings.user_id,
                                %err,
                                "reminder dispatch failed"
                            );
                            summary.failures.push(DispatchFailure {
                                user_id: settings.user_id.clone(),
                                reason: err.to_string(),
                            });
                        }
                    }
                }
                Outcome::NotOptedIn | Outcome::RecentlyActive | Outcome::AlreadyReminded => {
                    summary.users_skipped += 1;
                    tracing::debug!(
                        %run_id,
                        user = %settings.user_id,
                        outcome = outcome.as_str(),
                        "skipped"
                    );
                }
            }
        }

        tracing::info!(
            %run_id,
            evaluated = summary.users_evaluated,
            reminded = summary.users_reminded,
            skipped = summary.users_skipped,
            failed = summary.failures.len(),
            "reminder pass complete"
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
