//! Repository cloning through libgit2

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Cred, CredentialType, ErrorClass, ErrorCode, FetchOptions, RemoteCallbacks};

use crate::error::{ClientError, FailureKind};
use crate::progress::{ProgressEvent, ProgressSink};

/// Task names reported to the progress sink
pub const TASK_RECEIVING: &str = "Receiving objects";
pub const TASK_RESOLVING: &str = "Resolving deltas";
pub const TASK_CHECKOUT: &str = "Checking out files";

/// Credential callback invocations allowed before giving up
///
/// libgit2 keeps asking as long as the callback returns a credential, so a
/// rejected agent key would otherwise loop forever.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Something that can clone a repository into a directory
pub trait RepositoryClient {
    /// Clone `url` into the existing empty directory `target`
    ///
    /// Blocks until the clone completes or fails. `branch` of `None`
    /// checks out the remote's default branch.
    fn clone_to(
        &self,
        url: &str,
        target: &Path,
        branch: Option<&str>,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), ClientError>;
}

/// [`RepositoryClient`] backed by git2
#[derive(Debug, Clone, Default)]
pub struct Git2Client;

impl Git2Client {
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryClient for Git2Client {
    fn clone_to(
        &self,
        url: &str,
        target: &Path,
        branch: Option<&str>,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), ClientError> {
        let bridge = RefCell::new(ProgressBridge::new(sink));
        let credential_attempts = Cell::new(0u32);

        let mut callbacks = RemoteCallbacks::new();
        callbacks.transfer_progress(|stats| {
            let mut bridge = bridge.borrow_mut();
            bridge.report(
                TASK_RECEIVING,
                stats.received_objects(),
                stats.total_objects(),
            );
            if stats.total_deltas() > 0 {
                bridge.report(TASK_RESOLVING, stats.indexed_deltas(), stats.total_deltas());
            }
            true
        });
        callbacks.sideband_progress(|data| {
            bridge
                .borrow_mut()
                .remote_message(&String::from_utf8_lossy(data));
            true
        });
        callbacks.credentials(|cred_url, username_from_url, allowed| {
            let attempt = credential_attempts.get() + 1;
            credential_attempts.set(attempt);
            if attempt > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::new(
                    ErrorCode::Auth,
                    ErrorClass::Callback,
                    format!("no accepted credentials for {}", cred_url),
                ));
            }
            credentials(cred_url, username_from_url, allowed)
        });

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let mut checkout = CheckoutBuilder::new();
        checkout.progress(|_path, current, total| {
            bridge.borrow_mut().report(TASK_CHECKOUT, current, total);
        });

        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_options).with_checkout(checkout);
        if let Some(branch) = branch {
            builder.branch(branch);
        }

        tracing::debug!(url, target = %target.display(), ?branch, "Starting git2 clone");

        builder
            .clone(url, target)
            .map(|_repo| ())
            .map_err(|e| ClientError::new(classify(&e, branch), e))
    }
}

/// Forwards git2 callbacks to a [`ProgressSink`], timing each task
struct ProgressBridge<'s> {
    sink: &'s mut dyn ProgressSink,
    started: HashMap<&'static str, Instant>,
}

impl<'s> ProgressBridge<'s> {
    fn new(sink: &'s mut dyn ProgressSink) -> Self {
        Self {
            sink,
            started: HashMap::new(),
        }
    }

    fn report(&mut self, task: &'static str, current: usize, total: usize) {
        let started = *self.started.entry(task).or_insert_with(Instant::now);
        self.sink.update(ProgressEvent::new(
            task,
            current as u64,
            total as u64,
            started.elapsed(),
        ));
    }

    fn remote_message(&mut self, text: &str) {
        self.sink.remote_message(text);
    }
}

/// Pick credentials for the kinds libgit2 says the remote accepts
fn credentials(
    url: &str,
    username_from_url: Option<&str>,
    allowed: CredentialType,
) -> Result<Cred, git2::Error> {
    if allowed.contains(CredentialType::SSH_KEY) {
        return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
    }

    if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
        let config = git2::Config::open_default()?;
        return Cred::credential_helper(&config, url, username_from_url);
    }

    if allowed.contains(CredentialType::USERNAME) {
        return Cred::username(username_from_url.unwrap_or("git"));
    }

    Cred::default()
}

/// Categorize a git2 error
pub fn classify(err: &git2::Error, branch: Option<&str>) -> FailureKind {
    if err.code() == ErrorCode::Auth {
        return FailureKind::Authentication;
    }

    if err.code() == ErrorCode::NotFound {
        let names_branch = branch.is_some_and(|b| err.message().contains(b));
        if names_branch || err.class() == ErrorClass::Reference {
            return FailureKind::UnknownRef;
        }
        return FailureKind::NotFound;
    }

    match err.class() {
        ErrorClass::Ssh => FailureKind::Authentication,
        ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssl | ErrorClass::Os => {
            FailureKind::Network
        }
        _ => FailureKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressAggregator;
    use git2::{Repository, Signature};

    /// Create a repository with one commit on its default branch and on `feature`
    fn source_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        std::fs::write(dir.join("README.md"), "hello\n").unwrap();

        {
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("README.md")).unwrap();
            index.write().unwrap();
            let tree_id = index.write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            let sig = Signature::now("Test", "test@example.com").unwrap();
            let commit_id = repo
                .commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
                .unwrap();
            let commit = repo.find_commit(commit_id).unwrap();
            repo.branch("feature", &commit, false).unwrap();
        }

        repo
    }

    #[test]
    fn test_clone_local_repository() {
        let src = tempfile::tempdir().unwrap();
        source_repo(src.path());
        let dst = tempfile::tempdir().unwrap();

        let mut agg = ProgressAggregator::new();
        Git2Client::new()
            .clone_to(src.path().to_str().unwrap(), dst.path(), None, &mut agg)
            .unwrap();

        assert!(dst.path().join(".git").exists());
        assert_eq!(
            std::fs::read_to_string(dst.path().join("README.md")).unwrap(),
            "hello\n"
        );
        assert!(agg
            .summary()
            .text()
            .lines()
            .all(|l| !l.starts_with(char::is_whitespace)));
    }

    #[test]
    fn test_cloned_client_clones_repository() {
        let src = tempfile::tempdir().unwrap();
        source_repo(src.path());
        let dst = tempfile::tempdir().unwrap();

        let client = Git2Client::new().clone();
        let mut agg = ProgressAggregator::new();
        client
            .clone_to(src.path().to_str().unwrap(), dst.path(), None, &mut agg)
            .unwrap();

        assert!(dst.path().join("README.md").exists());
    }

    #[test]
    fn test_clone_with_branch() {
        let src = tempfile::tempdir().unwrap();
        source_repo(src.path());
        let dst = tempfile::tempdir().unwrap();

        let mut agg = ProgressAggregator::new();
        Git2Client::new()
            .clone_to(
                src.path().to_str().unwrap(),
                dst.path(),
                Some("feature"),
                &mut agg,
            )
            .unwrap();

        let cloned = Repository::open(dst.path()).unwrap();
        let head = cloned.head().unwrap();
        assert_eq!(head.shorthand(), Some("feature"));
    }

    #[test]
    fn test_clone_unknown_branch() {
        let src = tempfile::tempdir().unwrap();
        source_repo(src.path());
        let dst = tempfile::tempdir().unwrap();

        let mut agg = ProgressAggregator::new();
        let err = Git2Client::new()
            .clone_to(
                src.path().to_str().unwrap(),
                dst.path(),
                Some("no-such-branch"),
                &mut agg,
            )
            .unwrap_err();

        assert_eq!(err.kind, FailureKind::UnknownRef);
    }

    #[test]
    fn test_clone_unreachable_host() {
        let dst = tempfile::tempdir().unwrap();
        let mut agg = ProgressAggregator::new();

        let result = Git2Client::new().clone_to(
            "https://invalid.example.invalid/repo.git",
            dst.path(),
            None,
            &mut agg,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_classify() {
        let auth = git2::Error::new(ErrorCode::Auth, ErrorClass::Http, "401");
        assert_eq!(classify(&auth, None), FailureKind::Authentication);

        let dns = git2::Error::new(
            ErrorCode::GenericError,
            ErrorClass::Net,
            "failed to resolve address",
        );
        assert_eq!(classify(&dns, None), FailureKind::Network);

        let branch = git2::Error::new(
            ErrorCode::NotFound,
            ErrorClass::Invalid,
            "remote branch 'topic' not found",
        );
        assert_eq!(classify(&branch, Some("topic")), FailureKind::UnknownRef);

        let repo = git2::Error::new(
            ErrorCode::NotFound,
            ErrorClass::Repository,
            "could not find repository",
        );
        assert_eq!(classify(&repo, None), FailureKind::NotFound);

        let other = git2::Error::new(ErrorCode::GenericError, ErrorClass::Odb, "corrupt");
        assert_eq!(classify(&other, None), FailureKind::Other);
    }
}
