//! distclone core - clone a repository into a fresh temporary directory
//!
//! This crate validates clone arguments, provisions a temporary workspace,
//! runs a single clone through a [`RepositoryClient`] and condenses its
//! progress into a short summary.

pub mod config;
pub mod error;
pub mod git;
pub mod orchestrator;
pub mod progress;
pub mod request;
pub mod workspace;

pub use config::{Config, WorkspaceConfig};
pub use error::{ClientError, CloneError, Error, FailureKind, Result, ValidationError};
pub use git::{Git2Client, RepositoryClient};
pub use orchestrator::{CloneOrchestrator, CloneOutcome};
pub use progress::{CloneSummary, ProgressAggregator, ProgressEvent, ProgressSink};
pub use request::{resolve, CloneRequest, RepoLocator, DEFAULT_PROFILE};
pub use workspace::{Workspace, WorkspaceProvisioner};
