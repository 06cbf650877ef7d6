//! Query document shapes and persistence.
//!
//! The document format is externally defined; this tool only ever appends to
//! each entry's response list. Fields it does not understand are kept in
//! flattened maps so they round-trip through load/save unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A query file: a sequence of query entries plus whatever else the producer
/// put alongside them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDocument {
    pub queries: Vec<QueryEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One question and its accumulated answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryEntry {
    pub query: String,
    pub responses: Vec<ResponseRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One answer from one retrieval attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub mode: String,
    pub answer: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResponseRecord {
    pub fn new(mode: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            answer: answer.into(),
            extra: Map::new(),
        }
    }
}

impl QueryDocument {
    /// Parse a query file. Malformed JSON or a missing `queries` key is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read query file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse query file {}", path.display()))
    }

    /// Re-serialize the whole document as pretty JSON to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let pretty = serde_json::to_string_pretty(self)
            .with_context(|| format!("serialize query file {}", path.display()))?;
        fs::write(path, pretty)
            .with_context(|| format!("write query file {}", path.display()))
    }
}

/// Sibling backup path: `queries.json` -> `queries.json.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".bak");
    PathBuf::from(os)
}

/// Copy the untouched file bytes to the sibling `.bak` path so the pre-run
/// state survives any mutation.
pub fn write_backup(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path);
    fs::copy(path, &backup)
        .with_context(|| format!("back up {} to {}", path.display(), backup.display()))?;
    Ok(backup)
}
