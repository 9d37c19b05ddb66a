//! distclone CLI - clone a repository into a fresh temporary directory
//!
//! Prints the workspace path on success so scripts can pick it up.

use clap::Parser;
use distclone_core::{
    resolve, CloneError, CloneOrchestrator, CloneOutcome, Config, Git2Client, RepositoryClient,
    DEFAULT_PROFILE,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Clone a repository into a new temporary directory
#[derive(Parser, Debug)]
#[command(name = "distclone")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// External URL of the repository to clone
    #[arg(long)]
    url: String,

    /// Branch to check out (defaults to the remote's default branch)
    #[arg(long)]
    branch: Option<String>,

    /// Configuration profile
    #[arg(long, env = "DISTCLONE_PROFILE", default_value = DEFAULT_PROFILE)]
    profile: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let outcome = run(&cli, Config::load_with_overrides, Git2Client::new())?;
    println!("{}", outcome.workspace.path.display());

    Ok(())
}

/// Validate the arguments, then clone once
///
/// Configuration is only loaded after the arguments pass validation.
fn run<C: RepositoryClient>(
    cli: &Cli,
    load_config: impl FnOnce() -> distclone_core::Result<Config>,
    client: C,
) -> distclone_core::Result<CloneOutcome> {
    let request = resolve(
        Some(cli.url.as_str()),
        cli.branch.as_deref(),
        Some(cli.profile.as_str()),
    )?;

    // Load configuration with overrides
    let config = load_config()?;
    let workspace = config.workspace_for(&request.profile);

    if cli.verbose {
        tracing::info!(
            profile = %request.profile,
            root = %workspace.provisioner().root().display(),
            prefix = %workspace.prefix,
            "Configuration loaded"
        );
    }

    let orchestrator = CloneOrchestrator::new(client, workspace.provisioner());

    orchestrator.clone_repository(&request).map_err(|e| {
        match &e {
            CloneError::CloneFailed {
                source,
                partial_path,
            } => tracing::error!(
                url = %request.url,
                kind = %source.kind,
                partial_path = %partial_path.display(),
                "Clone failed: {}",
                source.source
            ),
            CloneError::WorkspaceUnavailable { source } => {
                tracing::error!("Could not create a temporary workspace: {}", source)
            }
        }
        e.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use distclone_core::{ClientError, Error, FailureKind, ProgressSink, ValidationError};
    use std::cell::Cell;
    use std::path::Path;

    #[test]
    fn test_parse_full() {
        let cli = Cli::try_parse_from([
            "distclone",
            "--url",
            "https://example.com/repo.git",
            "--branch",
            "main",
            "--profile",
            "prod",
        ])
        .unwrap();

        assert_eq!(cli.url, "https://example.com/repo.git");
        assert_eq!(cli.branch.as_deref(), Some("main"));
        assert_eq!(cli.profile, "prod");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_url_required() {
        assert!(Cli::try_parse_from(["distclone"]).is_err());
    }

    #[test]
    fn test_branch_optional() {
        let cli = Cli::try_parse_from(["distclone", "--url", "/srv/git/repo"]).unwrap();
        assert!(cli.branch.is_none());
    }

    /// Counts clone attempts and writes a marker file into the target
    struct CountingClient<'a> {
        calls: &'a Cell<u32>,
    }

    impl RepositoryClient for CountingClient<'_> {
        fn clone_to(
            &self,
            _url: &str,
            target: &Path,
            _branch: Option<&str>,
            _sink: &mut dyn ProgressSink,
        ) -> Result<(), ClientError> {
            self.calls.set(self.calls.get() + 1);
            std::fs::write(target.join("README.md"), "cloned")
                .map_err(|e| ClientError::new(FailureKind::Other, e))
        }
    }

    fn config_in(root: &Path) -> impl FnOnce() -> distclone_core::Result<Config> {
        let root = root.to_path_buf();
        move || Ok(Config::default().with_temp_dir(Some(root)))
    }

    #[test]
    fn test_empty_url_rejected_before_clone() {
        let root = tempfile::tempdir().unwrap();
        let calls = Cell::new(0);
        let cli = Cli::try_parse_from(["distclone", "--url", ""]).unwrap();

        let err = run(&cli, config_in(root.path()), CountingClient { calls: &calls }).unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingUrl)
        ));
        assert_eq!(calls.get(), 0);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_url_does_not_load_config() {
        let cli = Cli::try_parse_from(["distclone", "--url", "  "]).unwrap();
        let calls = Cell::new(0);

        let err = run(
            &cli,
            || panic!("config loaded for an invalid request"),
            CountingClient { calls: &calls },
        )
        .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_run_clones_into_configured_root() {
        let root = tempfile::tempdir().unwrap();
        let calls = Cell::new(0);
        let cli = Cli::try_parse_from([
            "distclone",
            "--url",
            "https://example.com/repo.git",
            "--branch",
            "main",
        ])
        .unwrap();

        let outcome = run(&cli, config_in(root.path()), CountingClient { calls: &calls }).unwrap();

        assert_eq!(calls.get(), 1);
        assert!(outcome.workspace.path.starts_with(root.path()));
        assert!(outcome.workspace.path.join("README.md").exists());
    }

    #[test]
    fn test_workspace_failure_is_clone_error() {
        let root = tempfile::tempdir().unwrap();
        let calls = Cell::new(0);
        let cli = Cli::try_parse_from(["distclone", "--url", "/srv/git/repo"]).unwrap();

        let err = run(
            &cli,
            config_in(&root.path().join("missing")),
            CountingClient { calls: &calls },
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Clone(CloneError::WorkspaceUnavailable { .. })
        ));
        assert_eq!(calls.get(), 0);
    }
}
