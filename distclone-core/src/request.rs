//! Clone argument resolution
//!
//! Validates and normalizes the inputs of a clone before any I/O happens.

use std::path::PathBuf;

use crate::error::ValidationError;

/// Profile used when the caller does not supply one
pub const DEFAULT_PROFILE: &str = "default";

/// URL schemes git can fetch from
const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "ssh", "git", "file"];

/// A validated clone request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    /// Repository URL or path, trimmed
    pub url: String,
    /// Branch to check out; `None` uses the remote's default branch
    pub branch: Option<String>,
    /// Opaque configuration profile tag
    pub profile: String,
    /// Classified form of `url`
    pub locator: RepoLocator,
}

/// Where a repository URL points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocator {
    /// `scheme://host/path` style URL
    Remote { scheme: String, host: String },
    /// `[user@]host:path` SSH shorthand
    ScpLike {
        user: Option<String>,
        host: String,
        path: String,
    },
    /// Filesystem path to a repository
    Local(PathBuf),
}

impl RepoLocator {
    /// Classify a repository URL
    ///
    /// Supports:
    /// - `https://host/owner/repo.git` (also `http`, `ssh`, `git`, `file`)
    /// - `git@host:owner/repo.git`
    /// - anything else as a local path
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidUrl {
            url: input.to_string(),
            reason: reason.to_string(),
        };

        if input.contains("://") {
            let url = url::Url::parse(input).map_err(|e| invalid(&e.to_string()))?;
            let scheme = url.scheme().to_string();

            if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
                return Err(invalid(&format!("unsupported scheme '{}'", scheme)));
            }

            let host = url.host_str().unwrap_or("").to_string();
            if host.is_empty() && scheme != "file" {
                return Err(invalid("missing host"));
            }

            return Ok(Self::Remote { scheme, host });
        }

        // git@host:owner/repo.git, as long as no '/' precedes the first ':'
        if let Some((authority, path)) = input.split_once(':') {
            if !authority.contains('/') && !is_drive_prefix(authority) {
                let (user, host) = match authority.rsplit_once('@') {
                    Some((user, host)) => (Some(user), host),
                    None => (None, authority),
                };
                if user == Some("") || host.is_empty() || path.is_empty() {
                    return Err(invalid("expected [user@]host:path"));
                }
                return Ok(Self::ScpLike {
                    user: user.map(str::to_string),
                    host: host.to_string(),
                    path: path.to_string(),
                });
            }
        }

        Ok(Self::Local(PathBuf::from(input)))
    }

    /// Whether fetching from this locator goes over SSH
    pub fn is_ssh(&self) -> bool {
        match self {
            Self::Remote { scheme, .. } => scheme == "ssh",
            Self::ScpLike { .. } => true,
            Self::Local(_) => false,
        }
    }
}

/// `C` in `C:\repo`
fn is_drive_prefix(authority: &str) -> bool {
    authority.len() == 1 && authority.chars().all(|c| c.is_ascii_alphabetic())
}

/// Validate clone arguments into a [`CloneRequest`]
///
/// An empty branch counts as absent. Any other branch is kept verbatim,
/// surrounding whitespace included.
pub fn resolve(
    url: Option<&str>,
    branch: Option<&str>,
    profile: Option<&str>,
) -> Result<CloneRequest, ValidationError> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(ValidationError::MissingUrl)?;

    let locator = RepoLocator::parse(url)?;

    let branch = branch.filter(|b| !b.is_empty()).map(str::to_string);

    let profile = profile
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROFILE)
        .to_string();

    tracing::debug!(url, ?branch, %profile, ?locator, "Resolved clone request");

    Ok(CloneRequest {
        url: url.to_string(),
        branch,
        profile,
        locator,
    })
}
