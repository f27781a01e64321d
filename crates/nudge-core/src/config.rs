use crate::error::{NudgeError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inactivity threshold applied when no override is configured.
pub const DEFAULT_STALL_THRESHOLD_HOURS: i64 = 48;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// NotifierConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Provider endpoint receiving `{from, to, subject, text}` as JSON.
    #[serde(default)]
    pub endpoint: String,
    /// Bearer token for the provider, if it requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_from() -> String {
    "reminders@localhost".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            from: default_from(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3950
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_stall_threshold")]
    pub stall_threshold_hours: i64,
    /// Shared secret the cron trigger must present. Without one the trigger
    /// endpoint refuses to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_secret: Option<String>,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

fn default_stall_threshold() -> i64 {
    DEFAULT_STALL_THRESHOLD_HOURS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            stall_threshold_hours: DEFAULT_STALL_THRESHOLD_HOURS,
            cron_secret: None,
            notifier: NotifierConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// The configured inactivity threshold as a duration.
    pub fn stall_threshold(&self) -> chrono::Duration {
        chrono::Duration::hours(self.stall_threshold_hours)
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(NudgeError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Startup-time checks. Errors mark settings the service cannot operate
    /// without; warnings mark settings that degrade it.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.cron_secret.as_deref().unwrap_or("").is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "no cron secret configured; the reminder trigger will refuse all calls"
                    .to_string(),
            });
        }

        if self.notifier.endpoint.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "notifier endpoint not configured; every dispatch will fail".to_string(),
            });
        }

        if self.stall_threshold_hours <= 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "stall_threshold_hours={} must be positive",
                    self.stall_threshold_hours
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
