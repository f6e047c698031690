use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::cli::report;

/// Directory holding the workflow definitions, relative to the repository root.
pub const WORKFLOWS_DIR: &str = ".github/workflows";

const WORKFLOW_EXTENSIONS: &[&str] = &[".yml", ".yaml"];

/// Result of scanning for workflow files.
pub struct ScanResult {
    /// Workflow files in walk order (sorted by file name per directory).
    pub files: Vec<PathBuf>,
    pub skipped_count: usize,
}

fn is_workflow_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| WORKFLOW_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
}

/// Collect `.yml` / `.yaml` files under `dir`.
///
/// Paths that cannot be read are reported and skipped; they never abort the
/// scan.
pub fn scan_workflow_files(dir: &Path) -> ScanResult {
    let mut files = Vec::new();
    let mut skipped_count = 0;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                skipped_count += 1;
                report::print_walk_warning(&e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_workflow_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    ScanResult {
        files,
        skipped_count,
    }
}
