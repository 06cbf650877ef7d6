//! Runner configuration.
//!
//! Defaults can be overridden from `~/.config/ragbatch/config.toml`:
//!
//! ```toml
//! engine = "graphrag query"
//! delay_ms = 1000
//! persist = "per-query"
//! ```
//!
//! Precedence: CLI flag > environment variable > config file > built-in
//! default. A missing config file is not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Default engine command prefix.
pub const DEFAULT_ENGINE: &str = "graphrag query";
/// Default pause after each processed query.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// When to write a mutated document back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PersistMode {
    /// After every processed query entry. Bounds data loss on interruption.
    #[default]
    PerQuery,
    /// Once per file, after all entries are processed.
    PerFile,
}

/// On-disk config file shape; every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub engine: Option<String>,
    pub delay_ms: Option<u64>,
    pub persist: Option<PersistMode>,
}

impl ConfigFile {
    /// Load from the platform config dir, falling back to defaults.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ragbatch").join("config.toml"))
    }
}

/// Fully-resolved runner settings.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Engine command prefix, already word-split (e.g. `["graphrag", "query"]`).
    pub engine_command: Vec<String>,
    /// Pause after each processed query entry.
    pub delay: Duration,
    /// Persistence cadence.
    pub persist: PersistMode,
}

impl RunnerConfig {
    /// Merge CLI arguments over the config file over built-in defaults.
    pub fn resolve(cli: &Cli, file: &ConfigFile) -> Result<Self> {
        let engine = cli
            .engine
            .clone()
            .or_else(|| file.engine.clone())
            .unwrap_or_else(|| DEFAULT_ENGINE.to_string());
        let engine_command = shell_words::split(&engine)
            .with_context(|| format!("parse engine command {engine:?}"))?;
        ensure!(!engine_command.is_empty(), "engine command is empty");

        let delay_ms = cli.delay_ms.or(file.delay_ms).unwrap_or(DEFAULT_DELAY_MS);
        let persist = cli.persist.or(file.persist).unwrap_or_default();

        Ok(Self {
            engine_command,
            delay: Duration::from_millis(delay_ms),
            persist,
        })
    }
}
