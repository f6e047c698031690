//! Pin pass over workflow files.
//!
//! Files are processed one at a time and lines in order. After every
//! reference the session is checkpointed, and a file is written back only if
//! at least one of its lines changed.

use std::{
    fs,
    ops::AddAssign,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::debug;

use super::report;
use crate::core::{
    DecisionProvider, Outcome, PolicyEngine, Reference, RemoteService, Session, WorkflowFile,
    parse_reference,
};

/// Counters for a pin pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinStats {
    pub files_checked: usize,
    pub files_modified: usize,
    /// Lines rewritten, from fresh acceptances and cache hits.
    pub references_pinned: usize,
    pub cache_hits: usize,
    /// References whose resolution failed.
    pub failures: usize,
}

impl AddAssign for PinStats {
    fn add_assign(&mut self, other: Self) {
        self.files_checked += other.files_checked;
        self.files_modified += other.files_modified;
        self.references_pinned += other.references_pinned;
        self.cache_hits += other.cache_hits;
        self.failures += other.failures;
    }
}

/// Result of pinning a single file.
#[derive(Debug, Default)]
pub struct FileReport {
    pub stats: PinStats,
    /// The user chose to stop the run while in this file.
    pub aborted: bool,
}

/// Result of a full pin pass.
#[derive(Debug, Default)]
pub struct PinSummary {
    pub stats: PinStats,
    pub aborted: bool,
}

/// Pin every file in `files`, stopping early on an abort decision.
///
/// Per-file errors are reported and do not stop the pass.
pub fn pin_files<S, D>(
    files: &[PathBuf],
    engine: &mut PolicyEngine<S, D>,
    session: &mut Session,
    verbose: bool,
) -> PinSummary
where
    S: RemoteService,
    D: DecisionProvider,
{
    let mut summary = PinSummary::default();

    for path in files {
        if verbose {
            report::print_processing(path);
        }
        match pin_file(path, engine, session) {
            Ok(file_report) => {
                summary.stats += file_report.stats;
                if file_report.aborted {
                    summary.aborted = true;
                    break;
                }
            }
            Err(err) => report::print_file_error(path, &err),
        }
    }

    summary
}

/// Pin the references of one workflow file.
pub fn pin_file<S, D>(
    path: &Path,
    engine: &mut PolicyEngine<S, D>,
    session: &mut Session,
) -> Result<FileReport>
where
    S: RemoteService,
    D: DecisionProvider,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let mut file = WorkflowFile::parse(&content);
    let references: Vec<Reference> = file
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_reference(line, index))
        .collect();
    debug!(path = %path.display(), references = references.len(), "scanned file");

    let mut file_report = FileReport::default();
    file_report.stats.files_checked = 1;

    for reference in &references {
        match engine.evaluate(session, reference, path) {
            Outcome::Skipped(reason) => {
                debug!(key = %reference.key(), ?reason, "skipped");
            }
            Outcome::Failed(err) => {
                report::print_resolve_error(&reference.key(), &err);
                file_report.stats.failures += 1;
            }
            Outcome::Declined => {}
            Outcome::OrgAllowed => report::print_org_allowed(&reference.owner),
            Outcome::Rewrite {
                line,
                commit_sha,
                cached,
            } => {
                if cached {
                    report::print_cache_hit(&reference.key(), &commit_sha);
                    file_report.stats.cache_hits += 1;
                }
                if file.replace_line(reference.line_index, line) {
                    file_report.stats.references_pinned += 1;
                }
            }
            Outcome::Abort => {
                report::print_quit();
                file_report.aborted = true;
                break;
            }
        }
        session.checkpoint();
    }

    // Lines accepted before an abort are still written out.
    if file.is_modified() {
        fs::write(path, file.render())
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        report::print_file_updated(path);
        file_report.stats.files_modified = 1;
    }

    Ok(file_report)
}
