//! Run-scoped pinning state.
//!
//! [`Session`] owns the config for one run. After every completed line the
//! session publishes a snapshot to its [`Checkpoint`]; every exit path
//! (normal completion, abort, interrupt) persists through
//! [`Checkpoint::flush`], so the saved state is always "as of the last
//! completed line".

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::Result;
use tracing::debug;

use crate::config::{Config, save_config};

#[derive(Debug)]
struct CheckpointState {
    path: PathBuf,
    snapshot: Config,
}

/// Shared, persistable snapshot of the session config.
///
/// Clones share the same snapshot; the interrupt listener holds one.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    inner: Arc<Mutex<CheckpointState>>,
}

impl Checkpoint {
    pub fn new(path: &Path, config: &Config) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CheckpointState {
                path: path.to_path_buf(),
                snapshot: config.clone(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CheckpointState> {
        // A panic while holding the lock leaves a complete snapshot behind.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, config: &Config) {
        self.lock().snapshot = config.clone();
    }

    /// Write the latest snapshot to disk.
    pub fn flush(&self) -> Result<()> {
        let state = self.lock();
        debug!(path = %state.path.display(), "persisting config");
        save_config(&state.path, &state.snapshot)
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }
}

/// Allow list and acceptance cache for one run.
#[derive(Debug)]
pub struct Session {
    config: Config,
    checkpoint: Checkpoint,
}

impl Session {
    pub fn new(path: &Path, config: Config) -> Self {
        let checkpoint = Checkpoint::new(path, &config);
        Self { config, checkpoint }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle sharing this session's snapshot, e.g. with the interrupt listener.
    pub fn checkpoint_handle(&self) -> Checkpoint {
        self.checkpoint.clone()
    }

    pub fn is_allowed_org(&self, owner: &str) -> bool {
        self.config.is_allowed_org(owner)
    }

    pub fn allow_org(&mut self, owner: &str) -> bool {
        self.config.allow_org(owner)
    }

    pub fn accepted(&self, key: &str) -> Option<&str> {
        self.config.accepted_mapping.get(key).map(String::as_str)
    }

    pub fn accept(&mut self, key: &str, commit_sha: &str) {
        self.config
            .accepted_mapping
            .insert(key.to_string(), commit_sha.to_string());
    }

    /// Publish the current state as the last completed line's snapshot.
    pub fn checkpoint(&self) {
        self.checkpoint.record(&self.config);
    }

    /// Publish and persist the final state.
    pub fn close(self) -> Result<()> {
        self.checkpoint();
        self.checkpoint.flush()
    }
}
