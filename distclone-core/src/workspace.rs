//! Temporary clone workspaces

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Default directory name prefix for new workspaces
pub const DEFAULT_PREFIX: &str = "clone-";

/// A directory a repository is cloned into
///
/// Never removed by distclone; the caller owns it once a clone returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub path: PathBuf,
    pub created: DateTime<Utc>,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Creates uniquely named temporary directories
#[derive(Debug, Clone)]
pub struct WorkspaceProvisioner {
    /// Parent directory; the system temp dir when `None`
    root: Option<PathBuf>,
    /// Directory name prefix
    prefix: String,
}

impl Default for WorkspaceProvisioner {
    fn default() -> Self {
        Self {
            root: None,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl WorkspaceProvisioner {
    pub fn new(root: Option<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root,
            prefix: prefix.into(),
        }
    }

    /// Parent directory new workspaces are created in
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Create a new, empty workspace that is kept after drop
    pub fn provision(&self) -> std::io::Result<Workspace> {
        let dir = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempdir_in(self.root())?;

        Ok(Workspace {
            path: dir.keep(),
            created: Utc::now(),
        })
    }
}
