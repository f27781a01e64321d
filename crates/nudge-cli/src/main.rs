mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::settings::SettingsSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nudge",
    about = "Stalled-learner reminder engine — opt-in settings, progress ingest, and the cron-triggered dispatch pass",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data root containing the .nudge directory (default: current directory)
    #[arg(long, global = true, env = "NUDGE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the .nudge data directory with a default config
    Init,

    /// Start the HTTP server (cron trigger, settings, and progress APIs)
    Serve {
        /// Port to listen on (default: from config)
        #[arg(long)]
        port: Option<u16>,

        /// Shared secret for the cron trigger (overrides config)
        #[arg(long, env = "NUDGE_CRON_SECRET", hide_env_values = true)]
        cron_secret: Option<String>,
    },

    /// Run a single reminder pass and print the summary
    Run,

    /// Inspect or change a user's reminder settings
    Settings {
        #[command(subcommand)]
        subcommand: SettingsSubcommand,
    },

    /// Record a learning-progress event for a user
    Progress {
        user_id: String,

        /// Event time (RFC 3339; default: now)
        #[arg(long)]
        at: Option<chrono::DateTime<chrono::Utc>>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Serve { port, cron_secret } => cmd::serve::run(&root, port, cron_secret),
        Commands::Run => cmd::run::run(&root, cli.json),
        Commands::Settings { subcommand } => cmd::settings::run(&root, subcommand, cli.json),
        Commands::Progress { user_id, at } => cmd::progress::run(&root, &user_id, at, cli.json),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
