use anyhow::Context;
use nudge_core::config::Config;
use nudge_server::AppState;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>, cron_secret: Option<String>) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    if let Some(secret) = cron_secret {
        config.cron_secret = Some(secret);
    }
    let port = port.unwrap_or(config.server.port);

    let state = AppState::open(root, config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(nudge_server::serve(state, port))
}
