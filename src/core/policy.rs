//! Per-reference pinning policy.
//!
//! For each parsed reference, in order:
//!
//! 1. allow-listed owner → skip
//! 2. already pinned to a full sha → skip
//! 3. key in the acceptance cache → rewrite with the cached sha, no prompt
//! 4. otherwise resolve and ask the [`DecisionProvider`]
//!
//! A reference is only ever rewritten from a cache hit or an explicit
//! [`Decision::Accept`] for its exact key.

use std::path::Path;

use chrono::NaiveDate;

use super::reference::{RefKind, Reference};
use super::remote::RemoteService;
use super::resolver::{NestedTagNote, ResolveError, Resolver};
use super::rewrite::{pinned_usage, rewrite_line};
use super::session::Session;

/// Answer to a pinning proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Pin this reference and remember the mapping.
    Accept,
    /// Leave this reference untouched.
    Decline,
    /// Leave it untouched and allow the owner from now on.
    AllowOrg,
    /// Save progress and stop the run.
    Abort,
}

impl Decision {
    /// Parse a terminal answer (`y`, `n`, `a`, `q` or the long forms).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Some(Self::Accept),
            "n" | "no" => Some(Self::Decline),
            "a" | "allow" => Some(Self::AllowOrg),
            "q" | "quit" => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Proposed change shown to the decision provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal<'a> {
    pub file: &'a Path,
    /// Page to audit what the ref points to.
    pub audit_url: String,
    /// Replacement usage, without indentation.
    pub new_usage: String,
    /// Tag selected for a version prefix.
    pub tag: Option<&'a str>,
    pub note: Option<&'a NestedTagNote>,
}

pub trait DecisionProvider {
    fn decide(&mut self, reference: &Reference, proposal: &Proposal<'_>) -> Decision;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AllowedOrg,
    Pinned,
}

#[derive(Debug)]
pub enum Outcome {
    Skipped(SkipReason),
    Failed(ResolveError),
    Declined,
    OrgAllowed,
    /// Replace the line with `line`.
    Rewrite {
        line: String,
        commit_sha: String,
        cached: bool,
    },
    Abort,
}

pub struct PolicyEngine<S, D> {
    resolver: Resolver<S>,
    decider: D,
    today: NaiveDate,
}

impl<S: RemoteService, D: DecisionProvider> PolicyEngine<S, D> {
    pub fn new(resolver: Resolver<S>, decider: D, today: NaiveDate) -> Self {
        Self {
            resolver,
            decider,
            today,
        }
    }

    #[cfg(test)]
    pub(crate) fn resolver(&self) -> &Resolver<S> {
        &self.resolver
    }

    #[cfg(test)]
    pub(crate) fn decider(&self) -> &D {
        &self.decider
    }

    pub fn evaluate(&mut self, session: &mut Session, reference: &Reference, file: &Path) -> Outcome {
        if session.is_allowed_org(&reference.owner) {
            return Outcome::Skipped(SkipReason::AllowedOrg);
        }
        if reference.kind() == RefKind::Pinned {
            return Outcome::Skipped(SkipReason::Pinned);
        }

        let key = reference.key();
        if let Some(commit_sha) = session.accepted(&key) {
            return self.rewrite(reference, commit_sha.to_string(), true);
        }

        let resolution = match self.resolver.resolve(
            &reference.owner,
            reference.repository(),
            &reference.git_ref,
        ) {
            Ok(resolution) => resolution,
            Err(err) => return Outcome::Failed(err),
        };

        let proposal = Proposal {
            file,
            audit_url: reference.audit_url(),
            new_usage: pinned_usage(reference, &resolution.commit_sha, self.today),
            tag: resolution.tag.as_deref(),
            note: resolution.note.as_ref(),
        };

        match self.decider.decide(reference, &proposal) {
            Decision::Accept => {
                session.accept(&key, &resolution.commit_sha);
                self.rewrite(reference, resolution.commit_sha, false)
            }
            Decision::Decline => Outcome::Declined,
            Decision::AllowOrg => {
                session.allow_org(&reference.owner);
                Outcome::OrgAllowed
            }
            Decision::Abort => Outcome::Abort,
        }
    }

    fn rewrite(&self, reference: &Reference, commit_sha: String, cached: bool) -> Outcome {
        Outcome::Rewrite {
            line: rewrite_line(reference, &commit_sha, self.today),
            commit_sha,
            cached,
        }
    }
}
