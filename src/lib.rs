//! pmw - pin GitHub Actions to commit shas
//!
//! pmw scans `.github/workflows` for `uses: owner/repo@ref` references,
//! resolves each ref to the commit it currently points at, and rewrites the
//! line to the immutable sha after the user confirms. Decisions are kept in a
//! JSON config so later runs reuse them without asking again.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (arguments, prompts, reporting)
//! - `config`: Configuration file loading and saving
//! - `core`: Reference parsing, ref resolution, pin policy, line rewriting
//! - `scanner`: Workflow file discovery

pub mod cli;
pub mod config;
pub mod core;
pub mod scanner;
