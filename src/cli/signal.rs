//! Interrupt listener.
//!
//! A dedicated thread waits for SIGINT/SIGTERM (Ctrl+C on Windows). On
//! receipt it persists the session's last checkpoint and terminates the
//! process. A prompt may be blocked on stdin at that moment, so the listener
//! cannot hand control back to the main flow.

use std::{future::Future, io, process, thread};

use anyhow::{Context, Result};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use super::{exit_status::ExitStatus, report};
use crate::core::Checkpoint;

pub fn spawn_interrupt_listener(checkpoint: Checkpoint) -> Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start signal runtime")?;
    // Registered before returning so no signal slips through to the default handler.
    let shutdown = shutdown_signal(&runtime).context("Failed to register signal handlers")?;

    thread::Builder::new()
        .name("pmw-signal".to_string())
        .spawn(move || {
            let signal = runtime.block_on(shutdown);
            debug!(signal, "shutdown requested");
            report::print_interrupted(signal);
            if let Err(err) = checkpoint.flush() {
                report::print_save_error(&checkpoint.path(), &err);
            }
            process::exit(ExitStatus::Success.code());
        })
        .context("Failed to spawn signal listener")?;

    Ok(())
}

#[cfg(unix)]
fn shutdown_signal(runtime: &Runtime) -> io::Result<impl Future<Output = &'static str> + Send + 'static> {
    use tokio::signal::unix::{SignalKind, signal};

    let _guard = runtime.enter();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal(runtime: &Runtime) -> io::Result<impl Future<Output = &'static str> + Send + 'static> {
    let _guard = runtime.enter();
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
        "Ctrl+C"
    })
}
