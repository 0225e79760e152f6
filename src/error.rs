//! Error types for git-transfer.

use std::path::PathBuf;

use thiserror::Error;

use crate::dates::DateError;

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a transfer.
#[derive(Error, Debug)]
pub enum Error {
    /// Date range or date correlation failure.
    #[error(transparent)]
    Dates(#[from] DateError),

    /// A date string was not in `YYYY-MM-DD` form.
    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid repository URL: {0}")]
    InvalidUrl(String),

    #[error("could not extract repository name from URL: {0}")]
    RepoName(String),

    /// Missing or malformed operator input.
    #[error("{0}")]
    InvalidInput(String),

    /// A required executable is not on `PATH`.
    #[error("`{0}` not found in PATH")]
    ToolMissing(String),

    #[error("git-filter-repo not found; install it with `pip install --user git-filter-repo`")]
    FilterRepoMissing,

    /// The clone command succeeded but left no repository behind.
    #[error("failed to clone repository, directory {} not found", .0.display())]
    CloneMissing(PathBuf),

    /// An external command exited non-zero.
    #[error("`{command}` failed{}: {stderr}", exit_suffix(.code))]
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// An external command could not be started.
    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("prompt error: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!(" with exit code {c}"),
        None => String::new(),
    }
}
