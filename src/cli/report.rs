//! Report formatting and printing utilities.
//!
//! Everything the user sees during a run goes through here, so the core
//! engine stays free of printing side effects.

use std::{
    fmt::Display,
    io::{self, Write},
    path::Path,
};

use colored::Colorize;

use super::pin::PinStats;
use crate::core::{Proposal, Reference};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Printed before every reference that needs attention.
pub const SEPARATOR: &str = "-----------------------";

pub const CHOICES: &str = "Choose option: (y)es, (n)o, (a)dd to allowedOrgs, (q)uit: ";

pub fn print_processing(path: &Path) {
    eprintln!("{} Processing {}", "[+]".bold(), path.display());
}

pub fn print_cache_hit(key: &str, commit_sha: &str) {
    println!("{}", SEPARATOR);
    println!(
        "{}",
        format!("Previously accepted for {}: using commit {}", key, commit_sha).green()
    );
}

pub fn print_resolve_error(key: &str, err: &impl Display) {
    println!("{}", SEPARATOR);
    eprintln!(
        "{} Failed to retrieve commit SHA for {}: {}",
        "error:".bold().red(),
        key,
        err
    );
}

pub fn print_org_allowed(owner: &str) {
    println!("Added {} to allowed organizations.", owner.bold());
}

pub fn print_quit() {
    println!("Quitting processing...");
}

pub fn print_file_updated(path: &Path) {
    println!(
        "{}",
        format!("Updated file: {}", path.display()).green()
    );
}

pub fn print_file_error(path: &Path, err: &anyhow::Error) {
    eprintln!(
        "{} Error processing file {}: {:#}",
        "error:".bold().red(),
        path.display(),
        err
    );
}

pub fn print_walk_warning(err: &impl Display) {
    eprintln!("{} Cannot access path: {}", "warning:".bold().yellow(), err);
}

pub fn print_save_error(path: &Path, err: &anyhow::Error) {
    eprintln!(
        "{} Error saving config to {}: {:#}",
        "error:".bold().red(),
        path.display(),
        err
    );
}

pub fn print_signal_setup_warning(err: &anyhow::Error) {
    eprintln!(
        "{} Interrupts will not save progress: {:#}",
        "warning:".bold().yellow(),
        err
    );
}

pub fn print_interrupted(signal: &str) {
    eprintln!("Received signal: {}, saving config and exiting...", signal);
}

/// Write a pinning proposal followed by the choice prompt.
pub fn write_proposal<W: Write>(
    writer: &mut W,
    reference: &Reference,
    proposal: &Proposal<'_>,
) -> io::Result<()> {
    writeln!(writer, "{}", SEPARATOR)?;
    writeln!(writer, "[.]In File: {}", proposal.file.display())?;
    writeln!(
        writer,
        "{}",
        format!(
            "[-]Old: {} (Check URL: {})",
            reference.raw_line.trim(),
            proposal.audit_url
        )
        .red()
    )?;
    writeln!(
        writer,
        "{}",
        format!("[+]New: {}", proposal.new_usage).blue()
    )?;
    if let Some(tag) = proposal.tag {
        writeln!(writer, "[.]Latest tag for {}: {}", reference.git_ref, tag)?;
    }
    if let Some(note) = proposal.note {
        writeln!(
            writer,
            "{} {} points to an annotated tag, followed {} level(s); verify at {}",
            "note:".bold(),
            reference.git_ref,
            note.depth,
            note.lookup_url
        )?;
        if note.unresolved {
            writeln!(
                writer,
                "{} a tag object could not be read; the proposed sha is a tag object, not a commit",
                "warning:".bold().yellow()
            )?;
        }
    }
    write!(writer, "{}", CHOICES)?;
    writer.flush()
}

pub fn print_summary(stats: &PinStats) {
    print_summary_to(stats, &mut io::stdout().lock());
}

pub fn print_summary_to<W: Write>(stats: &PinStats, writer: &mut W) {
    if stats.references_pinned == 0 {
        writeln!(
            writer,
            "{} No references pinned ({} workflow file(s) checked).",
            SUCCESS_MARK.green(),
            stats.files_checked
        )
        .ok();
    } else {
        writeln!(
            writer,
            "{} Pinned {} reference(s) in {} file(s) ({} workflow file(s) checked).",
            SUCCESS_MARK.green(),
            stats.references_pinned,
            stats.files_modified,
            stats.files_checked
        )
        .ok();
    }

    if stats.cache_hits > 0 {
        writeln!(
            writer,
            "  {} of them reused a previously accepted commit.",
            stats.cache_hits
        )
        .ok();
    }

    if stats.failures > 0 {
        writeln!(
            writer,
            "{} {} reference(s) could not be resolved.",
            FAILURE_MARK.red(),
            stats.failures
        )
        .ok();
    }
}
