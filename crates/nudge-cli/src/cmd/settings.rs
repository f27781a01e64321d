use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use std::path::Path;

use nudge_core::config::Config;
use nudge_core::paths;
use nudge_core::store::{RedbStore, ReminderStore};
use nudge_core::types::{validate_user_id, ReminderSettings};
use nudge_core::NudgeError;

use crate::output::print_json;

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show a user's reminder settings
    Get { user_id: String },

    /// Create or update a user's reminder settings (opted in unless --opt-out)
    Set {
        user_id: String,

        /// Contact email for reminder delivery
        #[arg(long)]
        email: String,

        /// Opt the user out instead of in
        #[arg(long)]
        opt_out: bool,
    },
}

pub fn run(root: &Path, subcommand: SettingsSubcommand, json: bool) -> anyhow::Result<()> {
    Config::load(root).context("failed to load config")?;
    let store = RedbStore::open(&paths::db_path(root))?;

    match subcommand {
        SettingsSubcommand::Get { user_id } => {
            let settings = store
                .settings(&user_id)?
                .ok_or(NudgeError::UserNotFound(user_id))?;
            print_settings(&settings, json)
        }
        SettingsSubcommand::Set {
            user_id,
            email,
            opt_out,
        } => {
            validate_user_id(&user_id)?;
            let previous = store.settings(&user_id)?;
            let settings = ReminderSettings::apply_change(
                previous.as_ref(),
                &user_id,
                &email,
                !opt_out,
                Utc::now(),
            );
            store.upsert_settings(&settings)?;
            print_settings(&settings, json)
        }
    }
}

fn print_settings(settings: &ReminderSettings, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(settings);
    }
    println!("user:        {}", settings.user_id);
    println!("email:       {}", settings.email);
    println!(
        "opted in:    {}",
        if settings.opted_in { "yes" } else { "no" }
    );
    match settings.last_opt_in_at {
        Some(at) => println!("opted in at: {}", at.to_rfc3339()),
        None => println!("opted in at: never"),
    }
    println!("updated at:  {}", settings.updated_at.to_rfc3339());
    Ok(())
}
