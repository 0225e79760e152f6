//! The transfer pipeline.
//!
//! Clone the source repository bare, rewrite authors and messages with
//! `git filter-repo`, optionally rewrite dates with `git filter-branch`, then
//! mirror-push everything to the destination. Each step runs to completion
//! before the next one starts.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::dates::{DateError, DateRange, assign_dates, correlate};
use crate::error::{Error, Result};
use crate::filters::{Author, Replacement, commit_callback, env_filter_script};
use crate::git::{CommandRunner, Git};
use crate::remote::{clone_dir, repo_name, validate_repo_url};

/// Remote name used for the destination unless configured otherwise.
pub const DEFAULT_REMOTE: &str = "new-origin";

/// What to transfer and how to rewrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub old_url: String,
    pub new_url: String,
    pub author: Author,
    /// Randomize commit dates inside this range when set.
    pub date_range: Option<DateRange>,
    pub replacements: Vec<Replacement>,
}

/// Where and how the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    /// Directory the bare clone is created in.
    pub work_dir: PathBuf,
    pub remote_name: String,
    /// Leave the bare clone on disk afterwards.
    pub keep_clone: bool,
    /// Install `git-filter-repo` with pip when it is missing instead of
    /// failing.
    pub install_filter_repo: bool,
}

impl TransferOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            remote_name: DEFAULT_REMOTE.to_string(),
            keep_clone: false,
            install_filter_repo: true,
        }
    }
}

/// Summary of a finished transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    /// Commits found right after cloning.
    pub commits: usize,
    /// Commits that received a new date.
    pub dated_commits: usize,
}

/// Removes the bare clone when dropped, whatever happened before.
struct CloneDir {
    path: PathBuf,
    keep: bool,
}

impl Drop for CloneDir {
    fn drop(&mut self) {
        if self.keep || !self.path.exists() {
            return;
        }
        info!("Cleaning up temporary repository: {}", self.path.display());
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!("Could not remove {}: {e}", self.path.display());
        }
    }
}

/// Runs the whole transfer described by `request`.
///
/// `rng` drives date randomization and is only used when a date range is set.
pub fn transfer<R: Rng + ?Sized>(
    runner: &dyn CommandRunner,
    request: &TransferRequest,
    options: &TransferOptions,
    rng: &mut R,
) -> Result<TransferReport> {
    validate_repo_url(&request.old_url)?;
    validate_repo_url(&request.new_url)?;

    let name = repo_name(&request.old_url)?;
    let dest = clone_dir(&options.work_dir, &name);

    if dest.exists() {
        info!("Removing existing directory: {}", dest.display());
        fs::remove_dir_all(&dest)?;
    }

    let _clone = CloneDir {
        path: dest.clone(),
        keep: options.keep_clone,
    };

    info!("Cloning the repository...");
    let git = Git::clone_bare(runner, &options.work_dir, &request.old_url, &dest)?;
    if !dest.exists() {
        return Err(Error::CloneMissing(dest));
    }

    let commits = git.commit_count();
    info!("Found {commits} commits in repository");

    info!("Updating author information...");
    if !request.replacements.is_empty() {
        info!(
            "Will apply {} message replacement(s)",
            request.replacements.len()
        );
    }
    git.filter_repo(&commit_callback(&request.author, &request.replacements))?;

    let dated_commits = match &request.date_range {
        Some(range) => rewrite_dates(&git, range, rng)?,
        None => 0,
    };

    info!("Adding new repository remote...");
    if let Err(e) = git.remote_remove(&options.remote_name) {
        debug!("no existing remote to remove: {e}");
    }
    git.remote_add(&options.remote_name, &request.new_url)?;

    info!("Pushing all branches and tags to the new repository...");
    git.push_mirror(&options.remote_name)?;

    info!("Repository transfer complete");
    Ok(TransferReport {
        commits,
        dated_commits,
    })
}

/// Gives every commit a random date from `range`, oldest commit earliest.
///
/// Commits are re-counted first since the author rewrite may have dropped
/// some. A count that still disagrees with the commit list gets one corrective
/// regeneration.
fn rewrite_dates<R: Rng + ?Sized>(git: &Git<'_>, range: &DateRange, rng: &mut R) -> Result<usize> {
    info!("Modifying commit dates to random dates between {range}...");

    let count = git.commit_count();
    let dates = assign_dates(range, count, rng);
    let commits = git.commits_oldest_first()?;

    let mapping = match correlate(&commits, dates) {
        Ok(m) => m,
        Err(DateError::CountMismatch { commits: c, dates: d }) => {
            warn!("Commit count mismatch: {c} commits vs {d} dates, regenerating dates");
            correlate(&commits, assign_dates(range, commits.len(), rng))?
        }
        Err(e) => return Err(e.into()),
    };

    if mapping.is_empty() {
        info!("No commits to re-date");
        return Ok(0);
    }

    let script = env_filter_script(&mapping, &Local);
    let mut file = tempfile::Builder::new()
        .prefix("date_filter")
        .suffix(".sh")
        .tempfile()?;
    file.write_all(script.as_bytes())?;
    file.flush()?;

    git.filter_branch_env(file.path())?;
    drop_rewrite_leftovers(git);

    Ok(mapping.len())
}

/// Deletes `refs/original/*`, expires reflogs and prunes unreachable objects.
/// Failures only warn; the rewritten refs are already in place.
fn drop_rewrite_leftovers(git: &Git<'_>) {
    match git.original_refs() {
        Ok(refs) => {
            for r in refs {
                if let Err(e) = git.delete_ref(&r) {
                    warn!("Could not delete {r}: {e}");
                }
            }
        }
        Err(e) => warn!("Could not list backup refs: {e}"),
    }
    if let Err(e) = git.expire_reflog() {
        warn!("{e}");
    }
    if let Err(e) = git.gc() {
        warn!("{e}");
    }
}
