use std::path::PathBuf;

use clap::Parser;

use crate::config::PersistMode;

/// Batch-drive a GraphRAG engine across JSON query files.
///
/// For every `*.json` file in the queries directory, each query is run through
/// the engine's local and global retrieval modes and both answers are appended
/// to the query's response list. The original file is preserved as a sibling
/// `.bak` copy before any mutation.
#[derive(Debug, Parser)]
#[command(name = "ragbatch", version, about)]
pub struct Cli {
    /// GraphRAG project root, passed to the engine as --root.
    pub root: PathBuf,

    /// Directory scanned (non-recursively) for *.json query files.
    #[arg(default_value = "./queries")]
    pub queries_dir: PathBuf,

    /// Engine command prefix; --root/--method/--query are appended to it.
    #[arg(long, env = "RAGBATCH_ENGINE", value_name = "CMD")]
    pub engine: Option<String>,

    /// Pause after each processed query, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// When to write a mutated document back to disk.
    #[arg(long, value_enum)]
    pub persist: Option<PersistMode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn root_is_required() {
        assert!(Cli::try_parse_from(["ragbatch"]).is_err());
    }

    #[test]
    fn queries_dir_defaults() {
        let cli = Cli::try_parse_from(["ragbatch", "/data/project"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("/data/project"));
        assert_eq!(cli.queries_dir, PathBuf::from("./queries"));
        assert!(cli.engine.is_none());
        assert!(cli.delay_ms.is_none());
        assert!(cli.persist.is_none());
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "ragbatch",
            "/data/project",
            "./my-queries",
            "--engine",
            "graphrag query",
            "--delay-ms",
            "250",
            "--persist",
            "per-file",
        ])
        .unwrap();
        assert_eq!(cli.queries_dir, PathBuf::from("./my-queries"));
        assert_eq!(cli.engine.as_deref(), Some("graphrag query"));
        assert_eq!(cli.delay_ms, Some(250));
        assert_eq!(cli.persist, Some(PersistMode::PerFile));
    }
}
