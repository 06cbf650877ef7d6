pub mod batch;
pub mod cli;
pub mod config;
pub mod engine;
pub mod model;

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;

use crate::batch::BatchRunner;
use crate::cli::Cli;
use crate::config::{ConfigFile, RunnerConfig};
use crate::engine::EngineClient;

/// CLI entrypoint; called from main once logging is initialized.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let file_config = ConfigFile::load()?;
    let config = RunnerConfig::resolve(&cli, &file_config)?;

    let files = batch::find_query_files(&cli.queries_dir)?;
    if files.is_empty() {
        bail!("no JSON query files found in {}", cli.queries_dir.display());
    }
    tracing::info!(
        count = files.len(),
        dir = %cli.queries_dir.display(),
        "found query files"
    );

    // Resolve the engine binary before touching any file so a missing engine
    // fails fast with no backups written.
    let engine = EngineClient::new(config.engine_command.clone(), &cli.root)?;
    let resolved = engine.preflight()?;
    tracing::debug!(engine = %resolved.display(), "resolved engine binary");

    let runner = BatchRunner::new(engine, config);
    let report = runner.run(&files).await?;

    println!("{}", "All query files processed".green().bold());
    println!(
        "  files: {}  queries: {}  responses appended: {}",
        report.files.len(),
        report.total_queries(),
        report.total_responses()
    );
    if report.total_failures() > 0 {
        println!(
            "{}",
            format!("  engine failures: {}", report.total_failures()).yellow()
        );
    }

    Ok(())
}
