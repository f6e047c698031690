//! Wiring for a pin run: configuration, session, remote client, prompts.

use std::{
    io::{self, Write},
    path::Path,
};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::debug;

use super::{
    args::Arguments,
    exit_status::ExitStatus,
    pin::pin_files,
    prompt::{TerminalPrompt, prompt_initial_config},
    report,
    signal::spawn_interrupt_listener,
};
use crate::{
    config::{Config, load_config, save_config},
    core::{GitHubClient, PolicyEngine, Resolver, Session},
    scanner::{WORKFLOWS_DIR, scan_workflow_files},
};

pub fn run(args: Arguments) -> Result<ExitStatus> {
    let config = load_or_create_config(&args.config)?;
    let mut session = Session::new(&args.config, config);

    if let Err(err) = spawn_interrupt_listener(session.checkpoint_handle()) {
        report::print_signal_setup_warning(&err);
    }

    let client = GitHubClient::new(&args.api_url, args.token);
    let prompt = TerminalPrompt::new(io::stdin().lock(), io::stdout());
    let mut engine = PolicyEngine::new(Resolver::new(client), prompt, Local::now().date_naive());

    let scan = scan_workflow_files(Path::new(WORKFLOWS_DIR));
    debug!(
        files = scan.files.len(),
        skipped = scan.skipped_count,
        "scanned workflows"
    );

    let summary = pin_files(&scan.files, &mut engine, &mut session, args.verbose);

    if let Err(err) = session.close() {
        report::print_save_error(&args.config, &err);
    }
    report::print_summary(&summary.stats);

    Ok(ExitStatus::Success)
}

/// Load the configuration, asking for the allowed organizations on first run.
fn load_or_create_config(path: &Path) -> Result<Config> {
    if let Some(config) = load_config(path)? {
        return Ok(config);
    }

    let mut stdout = io::stdout();
    let config = prompt_initial_config(&mut io::stdin().lock(), &mut stdout)?;
    stdout.flush().ok();
    save_config(path, &config)
        .with_context(|| format!("Failed to create config: {}", path.display()))?;
    debug!(path = %path.display(), orgs = config.allowed_orgs.len(), "created config");

    Ok(config)
}
