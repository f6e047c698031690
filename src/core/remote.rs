//! Remote lookup service.
//!
//! The resolver only needs three capabilities from the code-hosting service,
//! captured by [`RemoteService`]. [`GitHubClient`] implements them against the
//! GitHub REST API with a blocking `ureq` agent.

use std::time::Duration;

use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;
use ureq::Agent;

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("pmw/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tags requested per page of the tag listing.
const TAGS_PER_PAGE: usize = 100;
/// Upper bound on pages fetched when listing tags.
const MAX_TAG_PAGES: usize = 10;

/// Failure of a single remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("invalid response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// A git object as reported by the remote: its type (`commit`, `tag`, ...)
/// and its sha.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub sha: String,
}

impl GitObject {
    pub fn is_tag(&self) -> bool {
        self.object_type == "tag"
    }
}

/// One entry of a repository's tag listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub name: String,
    pub commit_sha: String,
}

/// Capabilities the resolver needs from the code-hosting service.
pub trait RemoteService {
    /// Object the head of `branch` points to.
    fn branch_head(&self, owner: &str, repo: &str, branch: &str) -> Result<GitObject, RemoteError>;

    /// Dereference one level of the annotated tag object `sha`.
    fn tag_object(&self, owner: &str, repo: &str, sha: &str) -> Result<GitObject, RemoteError>;

    /// All tags of the repository, in the order the service lists them.
    fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<TagEntry>, RemoteError>;

    /// URL of the branch head lookup, reported for manual audit.
    fn branch_head_url(&self, owner: &str, repo: &str, branch: &str) -> String;
}

#[derive(Deserialize)]
struct RefResponse {
    object: GitObject,
}

#[derive(Deserialize)]
struct TagResponse {
    name: String,
    commit: TagCommit,
}

#[derive(Deserialize)]
struct TagCommit {
    sha: String,
}

/// GitHub REST API client.
pub struct GitHubClient {
    agent: Agent,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: Option<String>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn repo_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, owner, repo, path)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        debug!(%url, "GET");

        let mut request = self
            .agent
            .get(url)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let mut response = request.call().map_err(|e| RemoteError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "response");
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| RemoteError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

impl RemoteService for GitHubClient {
    fn branch_head(&self, owner: &str, repo: &str, branch: &str) -> Result<GitObject, RemoteError> {
        let url = self.branch_head_url(owner, repo, branch);
        let response: RefResponse = self.get_json(&url)?;
        Ok(response.object)
    }

    fn tag_object(&self, owner: &str, repo: &str, sha: &str) -> Result<GitObject, RemoteError> {
        let url = self.repo_url(owner, repo, &format!("git/tags/{}", sha));
        let response: RefResponse = self.get_json(&url)?;
        Ok(response.object)
    }

    fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<TagEntry>, RemoteError> {
        let mut tags = Vec::new();

        for page in 1..=MAX_TAG_PAGES {
            let url = self.repo_url(
                owner,
                repo,
                &format!("tags?per_page={}&page={}", TAGS_PER_PAGE, page),
            );
            let batch: Vec<TagResponse> = self.get_json(&url)?;
            let batch_len = batch.len();

            tags.extend(batch.into_iter().map(|tag| TagEntry {
                name: tag.name,
                commit_sha: tag.commit.sha,
            }));

            if batch_len < TAGS_PER_PAGE {
                break;
            }
        }

        Ok(tags)
    }

    fn branch_head_url(&self, owner: &str, repo: &str, branch: &str) -> String {
        self.repo_url(owner, repo, &format!("git/ref/heads/{}", branch))
    }
}
