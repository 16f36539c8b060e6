//! Participant configuration.
//!
//! Loaded from `./skynet.toml` (or `$SKYNET_CONFIG_PATH`). Environment
//! variables override file values; file values override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::transport::DEFAULT_REPLY_QUEUE;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "skynet.toml";

// ── Top-level config ────────────────────────────────────────────

/// Top-level participant configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SkynetConfig {
    /// Participant identity and queueing.
    pub participant: ParticipantConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl SkynetConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// `path` overrides the `$SKYNET_CONFIG_PATH` / `./skynet.toml` lookup.
    /// A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`SkynetConfig::load`] with a custom env resolver (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_with(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path_with(&env),
        };
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(env);
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides.
    fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("invalid config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config at {}: {e}",
                path.display()
            )),
        }
    }

    /// Apply environment variable overrides (env > config > defaults).
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("SKYNET_PARTICIPANT_NAME") {
            self.participant.name = v;
        }
        if let Some(v) = env("SKYNET_REPLY_QUEUE") {
            self.participant.reply_queue = v;
        }
        if let Some(v) = env("SKYNET_SHUTDOWN_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.participant.shutdown_timeout_seconds = n,
                Err(_) => tracing::warn!(
                    var = "SKYNET_SHUTDOWN_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("SKYNET_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env("SKYNET_LOGS_DIR") {
            self.logging.logs_dir = Some(PathBuf::from(v));
        }
    }

    /// Parse a TOML string into config (no env overrides).
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrongly typed values.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }
}

/// Resolve the config file path using a custom env resolver.
fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    env("SKYNET_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

// ── Participant config ──────────────────────────────────────────

/// Participant identity and queueing (`[participant]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParticipantConfig {
    /// Participant name registered with the engine.
    pub name: String,
    /// Queue replies are published to.
    pub reply_queue: String,
    /// Buffer size of the delivery channel.
    pub channel_buffer_size: usize,
    /// Grace period for in-flight workitems on shutdown, in seconds.
    pub shutdown_timeout_seconds: u64,
}

impl ParticipantConfig {
    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            name: "skynet".to_owned(),
            reply_queue: DEFAULT_REPLY_QUEUE.to_owned(),
            channel_buffer_size: 100,
            shutdown_timeout_seconds: 30,
        }
    }
}

// ── Logging config ──────────────────────────────────────────────

/// Log output settings (`[logging]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rotated JSON logs; stderr only when unset.
    pub logs_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            logs_dir: None,
        }
    }
}
