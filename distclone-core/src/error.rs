//! Error types for distclone

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for distclone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by a repository client backend
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for distclone operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid clone arguments
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Clone orchestration failure
    #[error(transparent)]
    Clone(#[from] CloneError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Rejected clone arguments. Raised before any I/O happens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No repository URL was given
    #[error("Repository URL is required")]
    MissingUrl,

    /// The URL is not something git can fetch from
    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failure of a clone invocation
#[derive(Error, Debug)]
pub enum CloneError {
    /// The temporary workspace could not be created
    #[error("Failed to create temporary workspace: {source}")]
    WorkspaceUnavailable {
        #[source]
        source: std::io::Error,
    },

    /// The repository client reported an error.
    ///
    /// The workspace is left on disk at `partial_path`.
    #[error("Clone failed ({}); partial clone left at {}", .source.kind, .partial_path.display())]
    CloneFailed {
        #[source]
        source: ClientError,
        partial_path: PathBuf,
    },
}

impl CloneError {
    /// Workspace left behind by a failed clone, if one was created
    pub fn partial_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::WorkspaceUnavailable { .. } => None,
            Self::CloneFailed { partial_path, .. } => Some(partial_path),
        }
    }
}

/// Broad category of a repository client failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credentials rejected or missing
    Authentication,
    /// Host unreachable, DNS failure, TLS or transport error
    Network,
    /// The requested branch does not exist on the remote
    UnknownRef,
    /// The repository does not exist at that location
    NotFound,
    /// Anything else
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Authentication => "authentication failed",
            Self::Network => "network error",
            Self::UnknownRef => "unknown branch",
            Self::NotFound => "repository not found",
            Self::Other => "git error",
        };
        f.write_str(s)
    }
}

/// Error reported by a [`RepositoryClient`](crate::RepositoryClient)
///
/// Displays only the failure category; the backend error is its `source()`.
#[derive(Error, Debug)]
#[error("{kind}")]
pub struct ClientError {
    pub kind: FailureKind,
    #[source]
    pub source: BoxError,
}

impl ClientError {
    pub fn new(kind: FailureKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}
