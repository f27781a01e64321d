use chrono::{DateTime, Duration, Utc};

use crate::types::{ActivityRecord, DedupRecord, ReminderSettings};

// ---------------------------------------------------------------------------
// StallContext
// ---------------------------------------------------------------------------

/// Everything the classifier is allowed to look at for one user. The caller
/// supplies the clock, so decisions replay exactly under test.
pub struct StallContext<'a> {
    pub now: DateTime<Utc>,
    pub settings: &'a ReminderSettings,
    pub activity: Option<&'a ActivityRecord>,
    pub dedup: Option<&'a DedupRecord>,
    pub threshold: Duration,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Due a reminder for the episode anchored at `anchor`. The anchor rides
    /// along so the dispatcher records the value the decision was made on.
    Eligible { anchor: DateTime<Utc> },
    NotOptedIn,
    RecentlyActive,
    AlreadyReminded,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Eligible { .. } => "eligible",
            Outcome::NotOptedIn => "not_opted_in",
            Outcome::RecentlyActive => "recently_active",
            Outcome::AlreadyReminded => "already_reminded",
        }
    }
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

/// Decide whether the user in `ctx` is due a stall reminder.
///
/// Pure and side-effect-free. The inactivity episode is anchored at the last
/// progress timestamp, or at the opt-in moment for learners who never
/// recorded progress. Exactly at the threshold counts as stalled.
pub fn classify(ctx: &StallContext) -> Outcome {
    if !ctx.settings.opted_in {
        return Outcome::NotOptedIn;
    }

    let anchor = ctx
        .activity
        .map(|a| a.last_progress_at)
        .or(ctx.settings.last_opt_in_at);
    let Some(anchor) = anchor else {
        // Opted in but with no activity and no opt-in stamp: nothing defines
        // an episode. Only records bypassing the settings write path look
        // like this; treated the same as having no settings at all.
        return Outcome::NotOptedIn;
    };

    if ctx.now - anchor < ctx.threshold {
        return Outcome::RecentlyActive;
    }

    if ctx.dedup.is_some_and(|d| d.episode_anchor == anchor) {
        return Outcome::AlreadyReminded;
    }

    Outcome::Eligible { anchor }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    fn settings(opted_in: bool, last_opt_in_at: Option<DateTime<Utc>>) -> ReminderSettings {
        ReminderSettings {
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            opted_in,
            last_opt_in_at,
            updated_at: now(),
        }
    }

    fn activity(hours_ago: i64) -> ActivityRecord {
        ActivityRecord {
            user_id: "u1".to_string(),
            last_progress_at: now() - Duration::hours(hours_ago),
        }
    }

    fn dedup(anchor: DateTime<Utc>) -> DedupRecord {
        DedupRecord {
            user_id: "u1".to_string(),
            last_reminder_sent_at: now() - Duration::hours(1),
            episode_anchor: anchor,
        }
    }

    fn ctx<'a>(
        settings: &'a ReminderSettings,
        activity: Option<&'a ActivityRecord>,
        dedup: Option<&'a DedupRecord>,
    ) -> StallContext<'a> {
        StallContext {
            now: now(),
            settings,
            activity,
            dedup,
            threshold: Duration::hours(48),
        }
    }

    #[test]
    fn opted_out_wins_regardless_of_state() {
        let s = settings(false, Some(now() - Duration::hours(100)));
        let a = activity(100);
        let d = dedup(a.last_progress_at);
        assert_eq!(classify(&ctx(&s, Some(&a), Some(&d))), Outcome::NotOptedIn);
    }

    #[test]
    fn stalled_user_is_eligible() {
        let s = settings(true, None);
        let a = activity(50);
        assert_eq!(
            classify(&ctx(&s, Some(&a), None)),
            Outcome::Eligible {
                anchor: a.last_progress_at
            }
        );
    }

    #[test]
    fn recent_activity_skips() {
        let s = settings(true, None);
        let a = activity(10);
        assert_eq!(classify(&ctx(&s, Some(&a), None)), Outcome::RecentlyActive);
    }

    #[test]
    fn exactly_at_threshold_is_stalled() {
        let s = settings(true, None);
        let a = activity(48);
        assert_eq!(
            classify(&ctx(&s, Some(&a), None)),
            Outcome::Eligible {
                anchor: a.last_progress_at
            }
        );
    }

    #[test]
    fn one_second_inside_threshold_is_recent() {
        let s = settings(true, None);
        let a = ActivityRecord {
            user_id: "u1".to_string(),
            last_progress_at: now() - Duration::hours(48) + Duration::seconds(1),
        };
        assert_eq!(classify(&ctx(&s, Some(&a), None)), Outcome::RecentlyActive);
    }

    #[test]
    fn same_episode_already_reminded() {
        let s = settings(true, None);
        let a = activity(50);
        let d = dedup(a.last_progress_at);
        assert_eq!(
            classify(&ctx(&s, Some(&a), Some(&d))),
            Outcome::AlreadyReminded
        );
    }

    #[test]
    fn resumed_then_stalled_again_is_a_new_episode() {
        let s = settings(true, None);
        // Reminded for an episode anchored 120h ago, then the learner resumed
        // and stalled again 50h ago.
        let d = dedup(now() - Duration::hours(120));
        let a = activity(50);
        assert_eq!(
            classify(&ctx(&s, Some(&a), Some(&d))),
            Outcome::Eligible {
                anchor: a.last_progress_at
            }
        );
    }

    #[test]
    fn never_active_anchors_at_opt_in() {
        let opt_in_at = now() - Duration::hours(72);
        let s = settings(true, Some(opt_in_at));
        assert_eq!(
            classify(&ctx(&s, None, None)),
            Outcome::Eligible { anchor: opt_in_at }
        );
    }

    #[test]
    fn freshly_opted_in_never_active_is_recent() {
        let s = settings(true, Some(now() - Duration::hours(2)));
        assert_eq!(classify(&ctx(&s, None, None)), Outcome::RecentlyActive);
    }

    #[test]
    fn activity_outranks_opt_in_stamp_as_anchor() {
        let opt_in_at = now() - Duration::hours(500);
        let s = settings(true, Some(opt_in_at));
        let a = activity(50);
        assert_eq!(
            classify(&ctx(&s, Some(&a), None)),
            Outcome::Eligible {
                anchor: a.last_progress_at
            }
        );
    }

    #[test]
    fn opted_in_without_any_anchor_is_not_opted_in() {
        let s = settings(true, None);
        assert_eq!(classify(&ctx(&s, None, None)), Outcome::NotOptedIn);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::NotOptedIn.as_str(), "not_opted_in");
        assert_eq!(
            Outcome::Eligible { anchor: now() }.as_str(),
            "eligible"
        );
    }
}
