//! Repository URL checks.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static LAST_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[/:]([^/:]+?)(\.git)?$").expect("static regex")
});

static GITHUB_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[/:][^/]+/([^/.]+)").expect("static regex")
});

/// URL schemes accepted for both the source and the destination.
const ACCEPTED_PREFIXES: [&str; 4] = ["http://", "https://", "ssh://", "git@"];

/// Rejects anything that is not an http(s), ssh or scp-like git URL.
pub fn validate_repo_url(url: &str) -> Result<()> {
    if ACCEPTED_PREFIXES.iter().any(|p| url.starts_with(p)) {
        Ok(())
    } else {
        Err(Error::InvalidUrl(url.to_string()))
    }
}

/// Extracts the repository name, e.g. `widgets` from
/// `https://github.com/acme/widgets.git` or `git@github.com:acme/widgets.git`.
pub fn repo_name(url: &str) -> Result<String> {
    if let Some(name) = LAST_SEGMENT.captures(url).and_then(|c| c.get(1)) {
        return Ok(name.as_str().to_string());
    }

    GITHUB_PATH
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::RepoName(url.to_string()))
}

/// Location of the bare clone for `name` inside `work_dir`.
pub fn clone_dir(work_dir: &Path, name: &str) -> PathBuf {
    work_dir.join(format!("{name}.git"))
}
