//! Persistent reminder state in a single redb database.
//!
//! Three tables keyed by user id:
//! - `settings` — opt-in state, written by the settings mutation path
//! - `activity` — last learning progress, written by the progress ingest
//! - `dedup` — one row per user recording the episode last reminded
//!
//! Values are JSON-encoded records. All writes go through redb's
//! single-writer transactions, so the last committed upsert for a key is the
//! one the next run sees.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{NudgeError, Result};
use crate::types::{ActivityRecord, DedupRecord, ReminderSettings};

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");
const ACTIVITY: TableDefinition<&str, &[u8]> = TableDefinition::new("activity");
const DEDUP: TableDefinition<&str, &[u8]> = TableDefinition::new("dedup");

fn store_err<E: std::fmt::Display>(e: E) -> NudgeError {
    NudgeError::Store(e.to_string())
}

// ---------------------------------------------------------------------------
// ReminderStore
// ---------------------------------------------------------------------------

/// Storage interface consumed by the dispatcher and the write paths.
///
/// Object-safe so tests can stand in an in-memory fake. Infrastructure faults
/// surface as [`NudgeError::Store`], which the dispatcher treats as fatal to
/// the current run.
pub trait ReminderStore: Send + Sync {
    /// All settings records with `opted_in = true`.
    fn opted_in_users(&self) -> Result<Vec<ReminderSettings>>;

    fn settings(&self, user_id: &str) -> Result<Option<ReminderSettings>>;

    fn upsert_settings(&self, settings: &ReminderSettings) -> Result<()>;

    fn activity(&self, user_id: &str) -> Result<Option<ActivityRecord>>;

    /// Record a progress event. Timestamps older than the stored one are
    /// ignored, so late-arriving events cannot rewind the activity clock.
    fn record_progress(&self, record: &ActivityRecord) -> Result<()>;

    fn dedup(&self, user_id: &str) -> Result<Option<DedupRecord>>;

    /// Write the dedup row for a user. Re-writing the same
    /// `(user_id, episode_anchor)` is a no-op in effect; for a given key the
    /// last committed write wins.
    fn upsert_dedup(&self, record: &DedupRecord) -> Result<()>;
}

// ---------------------------------------------------------------------------
// RedbStore
// ---------------------------------------------------------------------------

pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the database at `path`, ensuring all tables exist
    /// before the first read.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(store_err)?;
        let wt = db.begin_write().map_err(store_err)?;
        wt.open_table(SETTINGS).map_err(store_err)?;
        wt.open_table(ACTIVITY).map_err(store_err)?;
        wt.open_table(DEDUP).map_err(store_err)?;
        wt.commit().map_err(store_err)?;
        Ok(Self { db })
    }

    fn get<T: DeserializeOwned>(
        &self,
        def: TableDefinition<&'static str, &'static [u8]>,
        user_id: &str,
    ) -> Result<Option<T>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(def).map_err(store_err)?;
        match table.get(user_id).map_err(store_err)? {
            Some(value) => {
                let record = serde_json::from_slice(value.value()).map_err(store_err)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(
        &self,
        def: TableDefinition<&'static str, &'static [u8]>,
        user_id: &str,
        record: &T,
    ) -> Result<()> {
        let value = serde_json::to_vec(record).map_err(store_err)?;
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut table = wt.open_table(def).map_err(store_err)?;
            table.insert(user_id, value.as_slice()).map_err(store_err)?;
        }
        wt.commit().map_err(store_err)?;
        Ok(())
    }
}

impl ReminderStore for RedbStore {
    fn opted_in_users(&self) -> Result<Vec<ReminderSettings>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let table = rt.open_table(SETTINGS).map_err(store_err)?;
        let mut result = Vec::new();
        for entry in table.iter().map_err(store_err)? {
            let (_, value) = entry.map_err(store_err)?;
            let settings: ReminderSettings =
                serde_json::from_slice(value.value()).map_err(store_err)?;
            if settings.opted_in {
                result.push(settings);
            }
        }
        Ok(result)
    }

    fn settings(&self, user_id: &str) -> Result<Option<ReminderSettings>> {
        self.get(SETTINGS, user_id)
    }

    fn upsert_settings(&self, settings: &ReminderSettings) -> Result<()> {
        self.put(SETTINGS, &settings.user_id, settings)
    }

    fn activity(&self, user_id: &str) -> Result<Option<ActivityRecord>> {
        self.get(ACTIVITY, user_id)
    }

    fn record_progress(&self, record: &ActivityRecord) -> Result<()> {
        if let Some(current) = self.activity(&record.user_id)? {
            if current.last_progress_at >= record.last_progress_at {
                return Ok(());
            }
        }
        self.put(ACTIVITY, &record.user_id, record)
    }

    fn dedup(&self, user_id: &str) -> Result<Option<DedupRecord>> {
        self.get(DEDUP, user_id)
    }

    fn upsert_dedup(&self, record: &DedupRecord) -> Result<()> {
        self.put(DEDUP, &record.user_id, record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use tempfile::TempDir;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn settings(user_id: &str, opted_in: bool) -> ReminderSettings {
        ReminderSettings {
            user_id: user_id.to_string(),
            email: format!("{user_id}@example.com"),
            opted_in,
            last_opt_in_at: opted_in.then(|| t(9)),
            updated_at: t(9),
        }
    }

    fn open_store(dir: &TempDir) -> RedbStore {
        RedbStore::open(&dir.path().join("ledger.redb")).unwrap()
    }

    #[test]
    fn settings_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let s = settings("u1", true);
        store.upsert_settings(&s).unwrap();
        assert_eq!(store.settings("u1").unwrap(), Some(s));
    }

    #[test]
    fn missing_records_are_none() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert_eq!(store.settings("ghost").unwrap(), None);
        assert_eq!(store.activity("ghost").unwrap(), None);
        assert_eq!(store.dedup("ghost").unwrap(), None);
    }

    #[test]
    fn opted_in_users_filters_opted_out() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.upsert_settings(&settings("u1", true)).unwrap();
        store.upsert_settings(&settings("u2", false)).unwrap();
        store.upsert_settings(&settings("u3", true)).unwrap();

        let users = store.opted_in_users().unwrap();
        let ids: Vec<&str> = users.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u3"]);
    }

    #[test]
    fn upsert_settings_replaces() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.upsert_settings(&settings("u1", true)).unwrap();
        let mut off = settings("u1", false);
        off.last_opt_in_at = Some(t(9));
        store.upsert_settings(&off).unwrap();
        assert_eq!(store.settings("u1").unwrap(), Some(off));
        assert!(store.opted_in_users().unwrap().is_empty());
    }

    #[test]
    fn record_progress_advances_the_clock() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .record_progress(&ActivityRecord {
                user_id: "u1".to_string(),
                last_progress_at: t(10),
            })
            .unwrap();
        store
            .record_progress(&ActivityRecord {
                user_id: "u1".to_string(),
                last_progress_at: t(12),
            })
            .unwrap();
        assert_eq!(
            store.activity("u1").unwrap().unwrap().last_progress_at,
            t(12)
        );
    }

    #[test]
    fn record_progress_ignores_stale_events() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .record_progress(&ActivityRecord {
                user_id: "u1".to_string(),
                last_progress_at: t(12),
            })
            .unwrap();
        store
            .record_progress(&ActivityRecord {
                user_id: "u1".to_string(),
                last_progress_at: t(8),
            })
            .unwrap();
        assert_eq!(
            store.activity("u1").unwrap().unwrap().last_progress_at,
            t(12)
        );
    }

    #[test]
    fn dedup_upsert_is_idempotent_per_episode() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let record = DedupRecord {
            user_id: "u1".to_string(),
            last_reminder_sent_at: t(12),
            episode_anchor: t(6),
        };
        store.upsert_dedup(&record).unwrap();
        store.upsert_dedup(&record).unwrap();
        assert_eq!(store.dedup("u1").unwrap(), Some(record));
    }

    #[test]
    fn dedup_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store
            .upsert_dedup(&DedupRecord {
                user_id: "u1".to_string(),
                last_reminder_sent_at: t(12),
                episode_anchor: t(6),
            })
            .unwrap();
        let newer = DedupRecord {
            user_id: "u1".to_string(),
            last_reminder_sent_at: t(18),
            episode_anchor: t(14),
        };
        store.upsert_dedup(&newer).unwrap();
        assert_eq!(store.dedup("u1").unwrap(), Some(newer));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.upsert_settings(&settings("u1", true)).unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert!(store.settings("u1").unwrap().is_some());
    }
}
