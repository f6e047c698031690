//! Line rewriting for pinned references.

use chrono::NaiveDate;

use super::reference::{RefKind, Reference};

/// Provenance comment appended after the pinned sha.
///
/// `#<ref>` for tags and version prefixes, `#<ref>-YYYY-MM-DD` for branch
/// refs. The date is the day of the latest confirmation, so it is
/// recomputed on every run.
pub fn version_comment(reference: &Reference, today: NaiveDate) -> String {
    match reference.kind() {
        RefKind::Branch => format!("#{}-{}", reference.git_ref, today.format("%Y-%m-%d")),
        RefKind::Pinned | RefKind::Version => format!("#{}", reference.git_ref),
    }
}

/// The pinned usage without indentation: `uses: owner/repo@sha #comment`.
pub fn pinned_usage(reference: &Reference, commit_sha: &str, today: NaiveDate) -> String {
    format!(
        "uses: {}/{}@{} {}",
        reference.owner,
        reference.repo,
        commit_sha,
        version_comment(reference, today)
    )
}

/// Replacement for the reference's line.
///
/// Keeps the leading spaces and tabs, a comment marker (`# `) on a
/// commented-out step, and a YAML sequence marker (`- `) when the step
/// starts on this line.
pub fn rewrite_line(reference: &Reference, commit_sha: &str, today: NaiveDate) -> String {
    format!(
        "{}{}",
        line_prefix(&reference.raw_line),
        pinned_usage(reference, commit_sha, today)
    )
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Index of the first non-blank character at or after `from`.
fn skip_blanks(line: &str, from: usize) -> usize {
    line[from..]
        .find(|c: char| !is_blank(c))
        .map_or(line.len(), |offset| from + offset)
}

fn line_prefix(line: &str) -> &str {
    let mut end = skip_blanks(line, 0);

    if line[end..].starts_with('#') {
        end = skip_blanks(line, end + 1);
    }
    let end = match line[end..].strip_prefix('-') {
        Some(after) if after.starts_with(is_blank) => skip_blanks(line, end + 1),
        _ => end,
    };

    &line[..end]
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    /// `"\n"`, `"\r\n"`, or `""` for a final line without terminator.
    ending: &'static str,
}

/// A workflow file split into lines, remembering each line's terminator so
/// that rendering reproduces untouched lines byte for byte.
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    lines: Vec<Line>,
    modified: bool,
}

impl WorkflowFile {
    pub fn parse(content: &str) -> Self {
        let mut lines = Vec::new();
        let mut rest = content;

        while !rest.is_empty() {
            match rest.find('\n') {
                Some(pos) => {
                    let (text, ending) = match rest[..pos].strip_suffix('\r') {
                        Some(text) => (text, "\r\n"),
                        None => (&rest[..pos], "\n"),
                    };
                    lines.push(Line {
                        text: text.to_string(),
                        ending,
                    });
                    rest = &rest[pos + 1..];
                }
                None => {
                    lines.push(Line {
                        text: rest.to_string(),
                        ending: "",
                    });
                    rest = "";
                }
            }
        }

        Self {
            lines,
            modified: false,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    /// Replace the text of line `index`, keeping its terminator.
    ///
    /// Returns true if the text changed.
    pub fn replace_line(&mut self, index: usize, text: String) -> bool {
        match self.lines.get_mut(index) {
            Some(line) if line.text != text => {
                line.text = text;
                self.modified = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .flat_map(|line| [line.text.as_str(), line.ending])
            .collect()
    }
}
