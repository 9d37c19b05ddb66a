//! Clone orchestration
//!
//! Ties a [`CloneRequest`] to a fresh workspace and a single clone attempt.

use std::ffi::OsStr;

use crate::error::CloneError;
use crate::git::{Git2Client, RepositoryClient};
use crate::progress::{CloneSummary, ProgressAggregator};
use crate::request::CloneRequest;
use crate::workspace::{Workspace, WorkspaceProvisioner};

/// Environment variable naming the SSH client executable
pub const GIT_SSH_ENV: &str = "GIT_SSH";

/// A finished clone
#[derive(Debug, Clone)]
pub struct CloneOutcome {
    /// Directory holding the cloned repository, now owned by the caller
    pub workspace: Workspace,
    /// Final progress summary, flush-left
    pub summary: CloneSummary,
}

/// Runs one clone per call into a newly provisioned workspace
#[derive(Debug, Clone, Default)]
pub struct CloneOrchestrator<C = Git2Client> {
    client: C,
    provisioner: WorkspaceProvisioner,
}

impl<C: RepositoryClient> CloneOrchestrator<C> {
    pub fn new(client: C, provisioner: WorkspaceProvisioner) -> Self {
        Self {
            client,
            provisioner,
        }
    }

    /// Clone the requested repository into a new temporary directory
    ///
    /// Makes exactly one clone attempt. On failure the workspace is left on
    /// disk and its path is carried by [`CloneError::CloneFailed`].
    pub fn clone_repository(&self, request: &CloneRequest) -> Result<CloneOutcome, CloneError> {
        if let Some(warning) = ssh_warning(std::env::var_os(GIT_SSH_ENV).as_deref()) {
            tracing::warn!(url = %request.url, ssh = request.locator.is_ssh(), "{}", warning);
        }

        let workspace = self
            .provisioner
            .provision()
            .map_err(|source| CloneError::WorkspaceUnavailable { source })?;

        tracing::info!("Using {} for repository", workspace.path.display());

        let mut aggregator = ProgressAggregator::new();
        let result = self.client.clone_to(
            &request.url,
            &workspace.path,
            request.branch.as_deref(),
            &mut aggregator,
        );

        match result {
            Ok(()) => {
                let summary = aggregator.summary();
                tracing::info!("Clone summary:\n{}", summary);
                Ok(CloneOutcome { workspace, summary })
            }
            Err(source) => Err(CloneError::CloneFailed {
                source,
                partial_path: workspace.path,
            }),
        }
    }
}

/// Warning to emit when no SSH client is configured
///
/// Only advisory: HTTPS URLs and local paths clone fine without it.
pub fn ssh_warning(git_ssh: Option<&OsStr>) -> Option<String> {
    match git_ssh {
        Some(value) if !value.is_empty() => None,
        _ => Some(format!(
            "{} is not set (e.g. {}=/bin/ssh); cloning SSH URLs may fail",
            GIT_SSH_ENV, GIT_SSH_ENV
        )),
    }
}
