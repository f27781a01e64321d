use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use nudge_core::config::Config;
use nudge_core::notify::{HttpNotifier, Notifier};
use nudge_core::store::RedbStore;
use nudge_core::{io, paths};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RedbStore>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<Config>,
    /// Advisory guard serializing reminder passes within this process. A
    /// trigger arriving while a pass runs is turned away instead of racing
    /// the ledger.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<RedbStore>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        Self {
            store,
            notifier,
            config: Arc::new(config),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Open the store under `root` and wire the HTTP notifier from config.
    pub fn open(root: &Path, config: Config) -> anyhow::Result<Self> {
        io::ensure_dir(&paths::nudge_dir(root))?;
        let store = Arc::new(RedbStore::open(&paths::db_path(root))?);
        let notifier = Arc::new(HttpNotifier::new(&config.notifier)?);
        Ok(Self::new(store, notifier, config))
    }
}
