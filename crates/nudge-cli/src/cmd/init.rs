use nudge_core::config::Config;
use nudge_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let config_path = paths::config_path(root);
    if config_path.exists() {
        println!("already initialized: {}", config_path.display());
        return Ok(());
    }

    io::ensure_dir(&paths::nudge_dir(root))?;
    Config::default().save(root)?;

    println!("initialized {}", config_path.display());
    println!("set cron_secret and notifier.endpoint in the config before serving");
    Ok(())
}
