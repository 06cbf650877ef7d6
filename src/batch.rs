//! Batch driver for query files.
//!
//! Discovery is a non-recursive `*.json` glob over the queries directory.
//! Each file is backed up byte-for-byte to a sibling `.bak` before the first
//! mutation, then every query entry is run through both retrieval modes in
//! order. The document is re-persisted per the configured cadence so an
//! interrupted run loses at most the in-flight query.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{PersistMode, RunnerConfig};
use crate::engine::{EngineClient, SearchMethod};
use crate::model::{self, QueryDocument, ResponseRecord};

/// Find query files: every `*.json` directly inside `dir`, sorted for a
/// deterministic processing order. `.bak` siblings never match.
pub fn find_query_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.json");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("queries dir {} is not valid UTF-8", dir.display()))?;
    let mut files: Vec<PathBuf> = glob::glob(pattern)
        .with_context(|| format!("bad glob pattern {pattern:?}"))?
        .flatten()
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Outcome of processing a single query file.
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub path: PathBuf,
    /// Query entries the file contained.
    pub queries: usize,
    /// Response records appended across all entries.
    pub responses_appended: usize,
    /// Engine invocations that exited non-zero.
    pub engine_failures: usize,
    pub duration_ms: u64,
}

/// Accumulated outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn add(&mut self, report: FileReport) {
        self.files.push(report);
    }

    pub fn total_queries(&self) -> usize {
        self.files.iter().map(|f| f.queries).sum()
    }

    pub fn total_responses(&self) -> usize {
        self.files.iter().map(|f| f.responses_appended).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.files.iter().map(|f| f.engine_failures).sum()
    }
}

/// Sequentially drives the engine over a set of query files.
pub struct BatchRunner {
    engine: EngineClient,
    config: RunnerConfig,
}

impl BatchRunner {
    pub fn new(engine: EngineClient, config: RunnerConfig) -> Self {
        Self { engine, config }
    }

    /// Process every file in order. Engine failures are recorded in the
    /// documents and the report; document or filesystem errors are fatal.
    pub async fn run(&self, files: &[PathBuf]) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for path in files {
            report.add(self.process_file(path).await?);
        }
        Ok(report)
    }

    async fn process_file(&self, path: &Path) -> Result<FileReport> {
        let start = Instant::now();
        tracing::info!(file = %path.display(), "processing query file");

        let mut doc = QueryDocument::load(path)?;
        let backup = model::write_backup(path)?;
        tracing::debug!(backup = %backup.display(), "wrote pre-run backup");

        let total = doc.queries.len();
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("  {pos}/{len} {bar:30.cyan/blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut report = FileReport {
            path: path.to_path_buf(),
            queries: total,
            ..Default::default()
        };

        for idx in 0..total {
            let query_text = doc.queries[idx].query.clone();
            bar.set_message(truncate_for_display(&query_text, 50));
            tracing::debug!(
                query = %query_text,
                n = idx + 1,
                total,
                "running retrieval modes"
            );

            for method in SearchMethod::ALL {
                let answer = self.engine.query(method, &query_text).await?;
                if answer.failed {
                    report.engine_failures += 1;
                }
                doc.queries[idx]
                    .responses
                    .push(ResponseRecord::new(method.response_mode(), answer.text));
                report.responses_appended += 1;
            }

            if self.config.persist == PersistMode::PerQuery {
                doc.save(path)?;
            }
            bar.inc(1);

            if !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
        }

        if self.config.persist == PersistMode::PerFile && total > 0 {
            doc.save(path)?;
        }
        bar.finish_and_clear();

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            file = %path.display(),
            queries = total,
            failures = report.engine_failures,
            duration_ms = report.duration_ms,
            "file complete"
        );
        Ok(report)
    }
}

/// First `max` characters of a query for progress display.
fn truncate_for_display(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn find_query_files_matches_only_top_level_json() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.json"), "{}").unwrap();
        fs::write(tmp.path().join("a.json"), "{}").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        fs::write(tmp.path().join("a.json.bak"), "{}").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested").join("c.json"), "{}").unwrap();

        let files = find_query_files(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);
    }

    #[test]
    fn find_query_files_empty_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(find_query_files(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn batch_report_totals() {
        let mut report = BatchReport::default();
        report.add(FileReport {
            queries: 2,
            responses_appended: 4,
            engine_failures: 1,
            ..Default::default()
        });
        report.add(FileReport {
            queries: 3,
            responses_appended: 6,
            ..Default::default()
        });

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.total_queries(), 5);
        assert_eq!(report.total_responses(), 10);
        assert_eq!(report.total_failures(), 1);
    }

    #[test]
    fn truncate_keeps_short_text_verbatim() {
        assert_eq!(truncate_for_display("short", 50), "short");
    }

    #[test]
    fn truncate_cuts_on_char_boundaries() {
        let text = "日本語のテキストです";
        assert_eq!(truncate_for_display(text, 4), "日本語の...");
    }
}
