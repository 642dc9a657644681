//! Version-control plumbing over a [`CommandRunner`].
//!
//! Every operation that moves the working tree off the baseline branch hands
//! back a [`BranchGuard`]. The guard checks the baseline branch out again
//! when it is restored explicitly or dropped, so callers never duplicate
//! cleanup code on their error paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::process::{CommandError, CommandRunner, ToolOutput};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {command} failed: {detail}")]
    Command { command: String, detail: String },
    #[error(transparent)]
    Spawn(#[from] CommandError),
}

pub type Result<T> = std::result::Result<T, GitError>;

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

/// Handle to the single local checkout the pipeline operates on.
#[derive(Clone)]
pub struct Git {
    runner: Arc<dyn CommandRunner>,
    repo_dir: PathBuf,
    remote: String,
    baseline: String,
}

impl Git {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        repo_dir: impl Into<PathBuf>,
        remote: impl Into<String>,
        baseline: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            repo_dir: repo_dir.into(),
            remote: remote.into(),
            baseline: baseline.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// Local ref a unit's head is fetched into.
    pub fn unit_ref(prefix: &str, number: u64) -> String {
        format!("{prefix}/unit-{number}")
    }

    fn raw(&self, args: &[&str]) -> Result<ToolOutput> {
        Ok(self.runner.run(&self.repo_dir, "git", args)?)
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let output = self.raw(args)?;
        if !output.success() {
            return Err(GitError::Command {
                command: args.join(" "),
                detail: output.failure_detail(),
            });
        }
        Ok(output.stdout.trim().to_string())
    }

    pub fn current_branch(&self) -> Result<String> {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Fetch a unit's head into a local ref, replacing any previous copy.
    pub fn fetch_unit(&self, number: u64, local_ref: &str) -> Result<()> {
        let refspec = format!("+pull/{number}/head:{local_ref}");
        self.git(&["fetch", &self.remote, &refspec]).map(|_| ())
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", branch]).map(|_| ())
    }

    /// `true` when the working tree differs from `HEAD`.
    ///
    /// Uses `git diff --quiet`: exit 0 means no changes, 1 means changes.
    pub fn has_changes(&self) -> Result<bool> {
        let output = self.raw(&["diff", "--quiet"])?;
        match output.exit_code {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(GitError::Command {
                command: "diff --quiet".to_string(),
                detail: output.failure_detail(),
            }),
        }
    }

    pub fn add_all(&self) -> Result<()> {
        self.git(&["add", "-A"]).map(|_| ())
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.git(&["commit", "-m", message]).map(|_| ())
    }

    /// Create `name` from `start_point` and switch to it.
    pub fn create_branch(&self, name: &str, start_point: &str) -> Result<()> {
        self.git(&["checkout", "-b", name, start_point])?;
        info!(branch = name, start_point, "created branch");
        Ok(())
    }

    pub fn push(&self, branch: &str) -> Result<()> {
        self.git(&["push", "-u", &self.remote, branch]).map(|_| ())
    }

    /// Check out the baseline branch.
    pub fn restore_baseline(&self) -> Result<()> {
        self.checkout(&self.baseline)
    }

    /// Open a scope that checks the baseline out again when it ends.
    ///
    /// Take the scope *before* the first operation that may move the working
    /// tree so that a failure part-way through is still rolled back.
    pub fn scope(&self) -> BranchGuard<'_> {
        BranchGuard::new(self)
    }

    /// Check out `branch`, returning a guard that restores the baseline.
    ///
    /// On failure the baseline is restored before the error is returned.
    pub fn checkout_scoped(&self, branch: &str) -> Result<BranchGuard<'_>> {
        let guard = self.scope();
        self.checkout(branch)?;
        debug!(branch, "checked out scoped branch");
        Ok(guard)
    }

    /// Create `name` from `start_point` and switch to it, returning a guard
    /// that restores the baseline.
    pub fn create_branch_scoped(&self, name: &str, start_point: &str) -> Result<BranchGuard<'_>> {
        let guard = self.scope();
        self.create_branch(name, start_point)?;
        Ok(guard)
    }
}

// ---------------------------------------------------------------------------
// BranchGuard
// ---------------------------------------------------------------------------

/// RAII scope for "the working tree is off the baseline branch".
///
/// Call [`restore`](Self::restore) to observe the restore error; otherwise
/// the restore happens on drop and failures are logged.
#[must_use = "dropping the guard immediately restores the baseline branch"]
pub struct BranchGuard<'a> {
    git: &'a Git,
    restored: bool,
}

impl<'a> BranchGuard<'a> {
    fn new(git: &'a Git) -> Self {
        Self {
            git,
            restored: false,
        }
    }

    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.git.restore_baseline()
    }
}

impl Drop for BranchGuard<'_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.git.restore_baseline() {
            error!(
                baseline = %self.git.baseline,
                error = %e,
                "failed to restore baseline branch"
            );
        }
    }
}
