//! Client for the external GraphRAG engine.
//!
//! The engine is a black box driven one subprocess at a time as
//! `<prefix> --root <dir> --method <local|global> --query <text>`, with its
//! trimmed standard output taken as the answer. A non-zero exit is downgraded
//! to an error-placeholder answer so one bad query cannot sink a whole batch;
//! failing to spawn the engine at all is fatal.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;

/// Errors from driving the engine subprocess.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine command is empty")]
    EmptyCommand,

    #[error("engine binary `{program}` not found: {source}")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to spawn engine `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Retrieval mode the engine is asked to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    Local,
    Global,
}

impl SearchMethod {
    /// Both modes, in the order they are run for every query.
    pub const ALL: [SearchMethod; 2] = [SearchMethod::Local, SearchMethod::Global];

    /// Value passed to the engine's `--method` flag.
    pub fn as_arg(self) -> &'static str {
        match self {
            SearchMethod::Local => "local",
            SearchMethod::Global => "global",
        }
    }

    /// Mode label recorded in response records.
    pub fn response_mode(self) -> &'static str {
        match self {
            SearchMethod::Local => "graphrag_local",
            SearchMethod::Global => "graphrag_global",
        }
    }
}

impl std::fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Answer text from one engine invocation.
#[derive(Debug, Clone)]
pub struct QueryAnswer {
    /// Trimmed stdout on success, or an error-placeholder string on failure.
    pub text: String,
    /// Whether the engine exited non-zero.
    pub failed: bool,
}

/// Drives the engine subprocess for a fixed project root.
pub struct EngineClient {
    command: Vec<String>,
    root: PathBuf,
}

impl EngineClient {
    /// `command` is the word-split prefix, e.g. `["graphrag", "query"]`.
    pub fn new(command: Vec<String>, root: &Path) -> Result<Self, EngineError> {
        if command.is_empty() {
            return Err(EngineError::EmptyCommand);
        }
        Ok(Self {
            command,
            root: root.to_path_buf(),
        })
    }

    /// Resolve the engine binary up front so a missing engine fails before
    /// any query file is touched.
    pub fn preflight(&self) -> Result<PathBuf, EngineError> {
        which::which(&self.command[0]).map_err(|source| EngineError::NotFound {
            program: self.command[0].clone(),
            source,
        })
    }

    /// Run one query in one retrieval mode, awaiting the child to completion.
    pub async fn query(&self, method: SearchMethod, query: &str) -> Result<QueryAnswer, EngineError> {
        let args = self.build_args(method, query);
        let output = Command::new(&self.command[0])
            .args(&args)
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                program: self.command[0].clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(QueryAnswer {
                text: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                failed: false,
            });
        }

        let command = self.render_command(&args);
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        tracing::warn!(
            %command,
            status = %output.status,
            %stdout,
            %stderr,
            "engine query failed"
        );

        Ok(QueryAnswer {
            text: format!("Error: `{command}` exited with {}", output.status),
            failed: true,
        })
    }

    /// Arguments appended to the engine binary for one invocation.
    fn build_args(&self, method: SearchMethod, query: &str) -> Vec<String> {
        let mut args: Vec<String> = self.command[1..].to_vec();
        args.push("--root".into());
        args.push(self.root.to_string_lossy().into_owned());
        args.push("--method".into());
        args.push(method.as_arg().into());
        args.push("--query".into());
        args.push(query.to_string());
        args
    }

    /// Full command line, shell-quoted, for logs and error placeholders.
    fn render_command(&self, args: &[String]) -> String {
        let words = std::iter::once(self.command[0].as_str()).chain(args.iter().map(String::as_str));
        shell_words::join(words)
    }
}
