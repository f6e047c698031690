//! Pinning engine.
//!
//! - `reference`: `uses:` line parsing
//! - `version`: dotted version comparison
//! - `remote`: remote lookup service and its GitHub client
//! - `resolver`: ref → commit sha resolution
//! - `policy`: skip / reuse / prompt decisions per reference
//! - `rewrite`: replacement lines and line-ending preserving files
//! - `session`: allow list, acceptance cache and checkpoints for one run

pub mod policy;
pub mod reference;
pub mod remote;
pub mod resolver;
pub mod rewrite;
pub mod session;
pub mod version;

pub use policy::{Decision, DecisionProvider, Outcome, PolicyEngine, Proposal, SkipReason};
pub use reference::{RefKind, Reference, parse_reference};
pub use remote::{GitHubClient, RemoteError, RemoteService};
pub use resolver::{NestedTagNote, ResolveError, Resolution, Resolver};
pub use rewrite::WorkflowFile;
pub use session::{Checkpoint, Session};
