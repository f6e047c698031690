//! Workflow reference parsing.
//!
//! A reference is the `owner/repo@ref` target of a `uses:` line:
//!
//! ```yaml
//!     - uses: actions/checkout@v4
//! ```
//!
//! Lines that do not match the grammar yield nothing. That is not an error,
//! most lines of a workflow file are not action references.

use regex::Regex;
use std::sync::LazyLock;

static USES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"uses:\s*([^/]+)/([^@]+)@(\S+)").unwrap());

static COMMIT_SHA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").unwrap());

/// Branches whose head is resolved directly instead of through the tag list.
pub const TRACKED_BRANCHES: &[&str] = &["master", "main"];

/// How a reference's ref text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// `master` or `main`: resolved via the branch head.
    Branch,
    /// Already a full 40-hex commit sha.
    Pinned,
    /// A tag or a version prefix such as `v2`.
    Version,
}

impl RefKind {
    pub fn of(git_ref: &str) -> Self {
        if TRACKED_BRANCHES.contains(&git_ref) {
            Self::Branch
        } else if is_commit_sha(git_ref) {
            Self::Pinned
        } else {
            Self::Version
        }
    }
}

/// Returns true if `text` is a full lowercase 40-hex commit sha.
pub fn is_commit_sha(text: &str) -> bool {
    COMMIT_SHA_REGEX.is_match(text)
}

/// A parsed `uses: owner/repo@ref` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub owner: String,
    /// Literal text between `/` and `@`. May include a sub-path
    /// (`codeql-action/init`), see [`Reference::repository`].
    pub repo: String,
    pub git_ref: String,
    /// 0-based line index in the file.
    pub line_index: usize,
    pub raw_line: String,
}

impl Reference {
    pub fn kind(&self) -> RefKind {
        RefKind::of(&self.git_ref)
    }

    /// The repository name used for remote lookups.
    ///
    /// Actions living in a sub-directory (`github/codeql-action/init@v3`) are
    /// looked up through their repository, `codeql-action`.
    pub fn repository(&self) -> &str {
        self.repo.split('/').next().unwrap_or(&self.repo)
    }

    /// Acceptance cache key: `owner/repo@ref` using the literal ref text.
    pub fn key(&self) -> String {
        format!("{}/{}@{}", self.owner, self.repo, self.git_ref)
    }

    /// Human-facing page to audit what the ref currently points to.
    pub fn audit_url(&self) -> String {
        match self.kind() {
            RefKind::Branch => format!(
                "https://github.com/{}/{}/commits/{}/",
                self.owner,
                self.repository(),
                self.git_ref
            ),
            RefKind::Pinned => format!(
                "https://github.com/{}/{}/commit/{}",
                self.owner,
                self.repository(),
                self.git_ref
            ),
            RefKind::Version => format!(
                "https://github.com/{}/{}/releases/tag/{}",
                self.owner,
                self.repository(),
                self.git_ref
            ),
        }
    }
}

/// Extract a reference from a single line of a workflow file.
///
/// Returns `None` for lines without a `uses: owner/repo@ref` pattern and for
/// docker image references (`uses: docker://...`).
pub fn parse_reference(line: &str, line_index: usize) -> Option<Reference> {
    let captures = USES_REGEX.captures(line)?;
    let owner = captures.get(1)?.as_str();
    let repo = captures.get(2)?.as_str();
    let git_ref = captures.get(3)?.as_str();

    if owner.starts_with("docker:") {
        return None;
    }

    Some(Reference {
        owner: owner.to_string(),
        repo: repo.to_string(),
        git_ref: git_ref.to_string(),
        line_index,
        raw_line: line.to_string(),
    })
}
