use anyhow::Context;
use chrono::Utc;
use std::path::Path;

use nudge_core::config::Config;
use nudge_core::dispatcher::Dispatcher;
use nudge_core::notify::HttpNotifier;
use nudge_core::paths;
use nudge_core::store::RedbStore;

use crate::output::print_json;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = RedbStore::open(&paths::db_path(root))?;
    let notifier = HttpNotifier::new(&config.notifier)?;

    let dispatcher = Dispatcher::new(&store, &notifier, config.stall_threshold());
    let summary = dispatcher.run(Utc::now())?;

    if json {
        print_json(&summary)?;
    } else {
        println!("evaluated: {}", summary.users_evaluated);
        println!("reminded:  {}", summary.users_reminded);
        println!("skipped:   {}", summary.users_skipped);
        for failure in &summary.failures {
            println!("failed:    {} ({})", failure.user_id, failure.reason);
        }
    }
    Ok(())
}
