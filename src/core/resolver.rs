//! Ref → commit sha resolution.
//!
//! - `master` / `main` resolve through the branch head, following annotated
//!   tag objects until a non-tag object is reached.
//! - Any other ref is a version prefix: the highest tag whose name starts
//!   with it wins, and the commit sha recorded in the tag listing is used.

use std::cmp::Ordering;

use thiserror::Error;
use tracing::{debug, info};

use super::reference::RefKind;
use super::remote::{RemoteError, RemoteService, TagEntry};
use super::version::{compare_versions, normalize_tag};

/// Annotated tag chains deeper than this are rejected.
pub const MAX_TAG_DEPTH: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("failed to resolve {owner}/{repo}@{git_ref}: {source}")]
    Remote {
        owner: String,
        repo: String,
        git_ref: String,
        #[source]
        source: RemoteError,
    },

    #[error("no tag of {owner}/{repo} matches prefix {prefix}")]
    NoMatchingTag {
        owner: String,
        repo: String,
        prefix: String,
    },

    #[error("annotated tag chain of {owner}/{repo}@{git_ref} exceeds {max} levels", max = MAX_TAG_DEPTH)]
    TagChainTooDeep {
        owner: String,
        repo: String,
        git_ref: String,
    },
}

/// Emitted when a branch head pointed at an annotated tag that had to be
/// dereferenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedTagNote {
    /// The branch head lookup the chain started from.
    pub lookup_url: String,
    /// Number of tag objects followed.
    pub depth: usize,
    /// A tag object could not be read, so the resolved sha is that tag
    /// object's sha rather than a commit.
    pub unresolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub commit_sha: String,
    /// Winning tag name for version-prefix refs.
    pub tag: Option<String>,
    pub note: Option<NestedTagNote>,
}

pub struct Resolver<S> {
    service: S,
}

impl<S: RemoteService> Resolver<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    #[cfg(test)]
    pub(crate) fn service(&self) -> &S {
        &self.service
    }

    pub fn resolve(&self, owner: &str, repo: &str, git_ref: &str) -> Result<Resolution, ResolveError> {
        match RefKind::of(git_ref) {
            RefKind::Branch => self.resolve_branch(owner, repo, git_ref),
            RefKind::Version => self.resolve_prefix(owner, repo, git_ref),
            RefKind::Pinned => Ok(Resolution {
                commit_sha: git_ref.to_string(),
                tag: None,
                note: None,
            }),
        }
    }

    fn resolve_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<Resolution, ResolveError> {
        let remote_err = |source| ResolveError::Remote {
            owner: owner.to_string(),
            repo: repo.to_string(),
            git_ref: branch.to_string(),
            source,
        };

        let mut object = self
            .service
            .branch_head(owner, repo, branch)
            .map_err(remote_err)?;
        let head_is_tag = object.is_tag();
        let mut depth = 0;

        while object.is_tag() {
            if depth == MAX_TAG_DEPTH {
                return Err(ResolveError::TagChainTooDeep {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    git_ref: branch.to_string(),
                });
            }
            match self.service.tag_object(owner, repo, &object.sha) {
                Ok(next) => {
                    debug!(from = %object.sha, to = %next.sha, kind = %next.object_type, "dereferenced tag");
                    object = next;
                    depth += 1;
                }
                // An unreadable tag object ends the chain at the last known sha.
                Err(err) => {
                    debug!(sha = %object.sha, error = %err, "stopped following tag chain");
                    break;
                }
            }
        }

        let note = head_is_tag.then(|| {
            let lookup_url = self.service.branch_head_url(owner, repo, branch);
            let unresolved = object.is_tag();
            info!(%lookup_url, depth, unresolved, "resolved nested annotated tag");
            NestedTagNote {
                lookup_url,
                depth,
                unresolved,
            }
        });

        Ok(Resolution {
            commit_sha: object.sha,
            tag: None,
            note,
        })
    }

    fn resolve_prefix(&self, owner: &str, repo: &str, prefix: &str) -> Result<Resolution, ResolveError> {
        let tags = self
            .service
            .list_tags(owner, repo)
            .map_err(|source| ResolveError::Remote {
                owner: owner.to_string(),
                repo: repo.to_string(),
                git_ref: prefix.to_string(),
                source,
            })?;

        let latest = latest_matching_tag(&tags, prefix).ok_or_else(|| {
            ResolveError::NoMatchingTag {
                owner: owner.to_string(),
                repo: repo.to_string(),
                prefix: prefix.to_string(),
            }
        })?;
        debug!(prefix, tag = %latest.name, sha = %latest.commit_sha, "selected latest tag");

        Ok(Resolution {
            commit_sha: latest.commit_sha.clone(),
            tag: Some(latest.name.clone()),
            note: None,
        })
    }
}

/// Highest tag whose name starts with `prefix`, compared with the leading
/// `v` stripped. Among equal versions the lexicographically smallest name
/// wins, so the choice does not depend on listing order.
pub fn latest_matching_tag<'a>(tags: &'a [TagEntry], prefix: &str) -> Option<&'a TagEntry> {
    tags.iter()
        .filter(|tag| tag.name.starts_with(prefix))
        .fold(None, |best: Option<&TagEntry>, tag| match best {
            None => Some(tag),
            Some(current) => {
                let ordering =
                    compare_versions(normalize_tag(&tag.name), normalize_tag(&current.name));
                match ordering {
                    Ordering::Greater => Some(tag),
                    Ordering::Equal if tag.name < current.name => Some(tag),
                    _ => Some(current),
                }
            }
        })
}
