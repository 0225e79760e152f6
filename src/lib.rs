//! # git-transfer
//!
//! A CLI tool to move a Git repository to a new remote under a new identity.
//!
//! This crate provides functionality to:
//! - Clone a repository bare and rewrite every commit's author and committer
//! - Apply literal text replacements to commit messages
//! - Spread commit dates randomly over a date range, keeping their order
//! - Mirror-push the rewritten history to the new repository
//!
//! ## Usage
//!
//! ```bash
//! # Interactive: asks for everything
//! git-transfer
//!
//! # Non-interactive
//! git-transfer --yes \
//!     --old-url https://github.com/acme/widgets.git \
//!     --new-url git@github.com:newco/widgets.git \
//!     --name "Jane Doe" --email jane@example.com \
//!     --start-date 2021-01-01 --end-date 2021-06-30 \
//!     --replace acme=newco
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface and main entry point
//! - [`dates`] - Random commit dates and their correlation to commits
//! - [`filters`] - Scripts for `git filter-repo` and `git filter-branch`
//! - [`git`] - Process runner and Git command wrappers
//! - [`remote`] - Repository URL validation and naming
//! - [`tooling`] - Locating or installing `git-filter-repo`
//! - [`transfer`] - The clone, rewrite and push pipeline
//! - [`prompt`] - User input abstractions
//! - [`banner`] - Transfer summary box
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod dates;
pub mod error;
pub mod filters;
pub mod git;
pub mod prompt;
pub mod remote;
pub mod tooling;
pub mod transfer;

pub use error::{Error, Result};
