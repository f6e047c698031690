use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod args;
mod exit_status;
pub mod pin;
pub mod prompt;
pub mod report;
mod run;
mod signal;

pub use args::Arguments;
pub use exit_status::ExitStatus;

pub fn run_cli(args: Arguments) -> Result<ExitStatus> {
    init_tracing(args.verbose);
    run::run(args)
}

/// Diagnostics go to stderr. `RUST_LOG` overrides the level chosen by `-v`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pmw=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}
