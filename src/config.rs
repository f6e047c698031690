use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = ".github/pmw-config.json";

/// Persisted pinning policy.
///
/// - `allowed_orgs`: organizations whose actions may stay on version tags.
/// - `accepted_mapping`: previously accepted `owner/repo@ref` → commit sha.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub allowed_orgs: Vec<String>,
    #[serde(default)]
    pub accepted_mapping: BTreeMap<String, String>,
}

impl Config {
    /// Build a fresh config from a comma-separated organization list.
    ///
    /// Entries are trimmed and empty entries dropped.
    pub fn from_org_list(input: &str) -> Self {
        Self {
            allowed_orgs: input
                .split(',')
                .map(str::trim)
                .filter(|org| !org.is_empty())
                .map(String::from)
                .collect(),
            accepted_mapping: BTreeMap::new(),
        }
    }

    /// Returns true if `owner` matches an allowed organization, ignoring case.
    pub fn is_allowed_org(&self, owner: &str) -> bool {
        self.allowed_orgs
            .iter()
            .any(|org| org.eq_ignore_ascii_case(owner))
    }

    /// Add `owner` to the allowed organizations.
    ///
    /// Returns false if it was already allowed.
    pub fn allow_org(&mut self, owner: &str) -> bool {
        if self.is_allowed_org(owner) {
            return false;
        }
        self.allowed_orgs.push(owner.to_string());
        true
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config.")
    }
}

/// Load the config at `path`.
///
/// Returns `Ok(None)` if the file does not exist, so the caller can run the
/// first-run setup.
pub fn load_config(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(Some(config))
}

/// Write `config` to `path`, creating parent directories as needed.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, config.to_json()?)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}
