//! Version-control backend for gitscribe.
//!
//! Shells out to the `git` binary for the three operations the workflow needs
//! (diff, stage, commit). Every invocation runs with the resolved repository
//! root as its working directory, never the process's ambient one.

use std::path::Path;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use gitscribe_shared::{
    ChangeProbe, ChangeSet, Committer, Description, GitScribeError, RepoLocation, Result,
};

/// Arguments for the working-tree diff. Colour and external diff drivers are
/// disabled so the output is plain text regardless of user config.
const DIFF_ARGS: &[&str] = &[
    "--no-pager",
    "diff",
    "--no-color",
    "--no-ext-diff",
    "--relative=",
    ".",
];

// ---------------------------------------------------------------------------
// Repository discovery
// ---------------------------------------------------------------------------

/// Resolve the root of the tracked tree containing `start`.
///
/// Runs `git rev-parse --show-toplevel`; if that fails (not inside a
/// repository, git missing), falls back to `start` itself.
pub async fn resolve_repo_location(start: &Path) -> RepoLocation {
    let output = git_command(start)
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
            debug!(%root, "resolved repository root");
            RepoLocation::new(root)
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                start = %start.display(),
                stderr = %stderr.trim(),
                "not inside a git work tree, using start directory"
            );
            RepoLocation::new(fallback_root(start))
        }
        Err(e) => {
            warn!(start = %start.display(), error = %e, "could not run git, using start directory");
            RepoLocation::new(fallback_root(start))
        }
    }
}

/// A `git` invocation rooted at `dir`.
///
/// On unix the child gets its own process group, so a terminal Ctrl-C only
/// reaches gitscribe and an in-flight `add`/`commit` runs to completion.
fn git_command(dir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir).kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

fn fallback_root(start: &Path) -> std::path::PathBuf {
    std::fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf())
}

// ---------------------------------------------------------------------------
// GitRepo
// ---------------------------------------------------------------------------

/// `git`-CLI implementation of [`ChangeProbe`] and [`Committer`].
#[derive(Debug, Clone)]
pub struct GitRepo {
    location: RepoLocation,
}

impl GitRepo {
    pub fn new(location: RepoLocation) -> Self {
        Self { location }
    }

    /// The tracked root every command runs in.
    pub fn location(&self) -> &RepoLocation {
        &self.location
    }

    /// Run `git <args>` in the repository root and capture its output.
    async fn git(&self, args: &[&str]) -> std::io::Result<Output> {
        debug!(root = %self.location, ?args, "running git");
        git_command(self.location.path()).args(args).output().await
    }
}

/// Render a failed invocation as one line for error messages.
fn describe_failure(args: &[&str], output: &Output) -> String {
    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");

    format!("`git {}` exited with {code}: {detail}", args.join(" "))
}

#[async_trait]
impl ChangeProbe for GitRepo {
    async fn diff(&self) -> Result<ChangeSet> {
        let output = self
            .git(DIFF_ARGS)
            .await
            .map_err(|e| GitScribeError::Probe(format!("failed to spawn git: {e}")))?;

        if !output.status.success() {
            return Err(GitScribeError::Probe(describe_failure(DIFF_ARGS, &output)));
        }

        let diff = ChangeSet::new(String::from_utf8_lossy(&output.stdout));
        debug!(
            bytes = diff.as_str().len(),
            fingerprint = %diff.fingerprint(),
            "probed working tree"
        );
        Ok(diff)
    }
}

#[async_trait]
impl Committer for GitRepo {
    async fn stage_all(&self) -> Result<()> {
        let args = ["add", "-A"];
        let output = self
            .git(&args)
            .await
            .map_err(|e| GitScribeError::Stage(format!("failed to spawn git: {e}")))?;

        if !output.status.success() {
            return Err(GitScribeError::Stage(describe_failure(&args, &output)));
        }
        Ok(())
    }

    async fn commit(&self, message: &Description) -> Result<()> {
        let args = ["commit", "-m", message.as_str()];
        let output = self
            .git(&args)
            .await
            .map_err(|e| GitScribeError::Commit(format!("failed to spawn git: {e}")))?;

        if !output.status.success() {
            return Err(GitScribeError::Commit(describe_failure(&args, &output)));
        }

        let summary = String::from_utf8_lossy(&output.stdout);
        if let Some(first) = summary.lines().next() {
            info!(summary = %first.trim(), "git commit created");
        }
        Ok(())
    }
}
