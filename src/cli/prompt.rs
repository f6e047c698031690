//! Interactive terminal prompts.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use super::report;
use crate::config::Config;
use crate::core::{Decision, DecisionProvider, Proposal, Reference};

/// Decision provider asking on a terminal.
///
/// Generic over the streams so it can be driven from in-memory buffers.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one answer line. `None` on end of input or a read error.
    fn read_answer(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }
}

impl<R: BufRead, W: Write> DecisionProvider for TerminalPrompt<R, W> {
    fn decide(&mut self, reference: &Reference, proposal: &Proposal<'_>) -> Decision {
        report::write_proposal(&mut self.output, reference, proposal).ok();

        match self.read_answer().as_deref().and_then(Decision::parse) {
            Some(decision) => decision,
            None => {
                writeln!(self.output, "Invalid option, skipping.").ok();
                Decision::Decline
            }
        }
    }
}

/// First-run setup: ask for the organizations allowed to stay on tags.
pub fn prompt_initial_config<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Config> {
    writeln!(
        output,
        "No configuration found. Please enter a comma-separated list of allowed organizations:"
    )?;
    output.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read allowed organizations")?;
    Ok(Config::from_org_list(&line))
}
