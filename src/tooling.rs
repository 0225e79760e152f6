//! Locating `git` and `git-filter-repo`.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::git::{CommandRunner, Invocation};

const FILTER_REPO: &str = "git-filter-repo";

/// Install attempts, tried in order until the tool shows up.
const INSTALL_COMMANDS: [&[&str]; 2] = [
    &["install", "--user", FILTER_REPO],
    &["install", "--break-system-packages", FILTER_REPO],
];

/// Fails with [`Error::ToolMissing`] unless `git` is on `PATH`.
pub fn require_git() -> Result<PathBuf> {
    which::which("git").map_err(|_| Error::ToolMissing("git".to_string()))
}

/// Returns `current` with `extra` appended, unless it is already listed.
pub fn augmented_path(current: Option<&OsString>, extra: &Path) -> Result<OsString> {
    let mut dirs: Vec<PathBuf> = current
        .map(|p| env::split_paths(p).collect())
        .unwrap_or_default();
    if !dirs.iter().any(|d| d == extra) {
        dirs.push(extra.to_path_buf());
    }
    env::join_paths(dirs)
        .map_err(|e| Error::InvalidInput(format!("cannot extend PATH: {e}")))
}

fn find_filter_repo(path: Option<&OsString>) -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    which::which_in(FILTER_REPO, path, cwd).ok()
}

/// Makes sure `git-filter-repo` can be found by child processes.
///
/// Returns the `PATH` children must use: `None` when the inherited one
/// already works, `Some` when `~/.local/bin` had to be added after a pip
/// install. With `allow_install == false` a missing tool is an error straight
/// away.
pub fn ensure_filter_repo(
    runner: &dyn CommandRunner,
    allow_install: bool,
) -> Result<Option<OsString>> {
    install_filter_repo(runner, allow_install, env::var_os("PATH"), dirs::home_dir())
}

/// [`ensure_filter_repo`] against an explicit `PATH` and home directory.
fn install_filter_repo(
    runner: &dyn CommandRunner,
    allow_install: bool,
    inherited: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<Option<OsString>> {
    info!("Checking for git-filter-repo...");

    if let Some(found) = find_filter_repo(inherited.as_ref()) {
        info!("Using {}", found.display());
        return Ok(None);
    }
    if !allow_install {
        return Err(Error::FilterRepoMissing);
    }

    info!("git-filter-repo not found. Installing...");
    let path = match home {
        Some(home) => augmented_path(inherited.as_ref(), &home.join(".local").join("bin"))?,
        None => inherited.unwrap_or_default(),
    };

    for args in INSTALL_COMMANDS {
        let cmd = Invocation::new("pip", args.iter().copied());
        match runner.run(&cmd) {
            Ok(out) if out.success() => {}
            Ok(out) => warn!("`{}` failed: {}", cmd.display(), out.stderr.trim()),
            Err(e) => warn!("{e}"),
        }

        if let Some(found) = find_filter_repo(Some(&path)) {
            info!("git-filter-repo installed at: {}", found.display());
            return Ok(Some(path));
        }
    }

    Err(Error::FilterRepoMissing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::CommandOutput;
    use std::cell::RefCell;

    #[test]
    fn augmented_path_appends_missing_dir() {
        let current = env::join_paths(["/usr/bin", "/bin"]).unwrap();
        let path = augmented_path(Some(&current), Path::new("/home/me/.local/bin")).unwrap();

        let dirs: Vec<PathBuf> = env::split_paths(&path).collect();
        assert_eq!(
            dirs,
            [
                PathBuf::from("/usr/bin"),
                PathBuf::from("/bin"),
                PathBuf::from("/home/me/.local/bin"),
            ]
        );
    }

    #[test]
    fn augmented_path_does_not_duplicate() {
        let current = env::join_paths(["/usr/bin", "/home/me/.local/bin"]).unwrap();
        let path = augmented_path(Some(&current), Path::new("/home/me/.local/bin")).unwrap();
        assert_eq!(path, current);
    }

    #[test]
    fn augmented_path_without_inherited_path() {
        let path = augmented_path(None, Path::new("/opt/tools")).unwrap();
        assert_eq!(path, OsString::from("/opt/tools"));
    }

    #[test]
    fn filter_repo_lookup_honours_given_path() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let search = OsString::from(dir.path());
        assert!(find_filter_repo(Some(&search)).is_none());
    }

    #[cfg(unix)]
    fn write_stub(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        std::fs::create_dir_all(dir).expect("failed to create stub dir");
        let tool = dir.join(FILTER_REPO);
        std::fs::write(&tool, "#!/bin/sh\n").expect("failed to write stub");
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755))
            .expect("failed to chmod stub");
        tool
    }

    /// Fake pip: records every call and drops a `git-filter-repo` stub into
    /// `bin` on call number `installs_on` (1-based). Calls before that fail.
    struct FakePip {
        calls: RefCell<Vec<Invocation>>,
        bin: PathBuf,
        installs_on: usize,
    }

    impl FakePip {
        fn new(bin: PathBuf, installs_on: usize) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                bin,
                installs_on,
            }
        }
    }

    impl CommandRunner for FakePip {
        fn run(&self, cmd: &Invocation) -> Result<CommandOutput> {
            let mut calls = self.calls.borrow_mut();
            calls.push(cmd.clone());
            if calls.len() != self.installs_on {
                return Ok(CommandOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "externally-managed-environment".to_string(),
                });
            }

            #[cfg(unix)]
            write_stub(&self.bin);
            Ok(CommandOutput {
                code: Some(0),
                ..CommandOutput::default()
            })
        }
    }

    #[cfg(unix)]
    #[test]
    fn filter_repo_lookup_finds_executable() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let tool = write_stub(dir.path());

        let search = OsString::from(dir.path());
        assert_eq!(find_filter_repo(Some(&search)), Some(tool));
    }

    #[test]
    fn missing_tool_without_install_is_an_error() {
        let empty = tempfile::tempdir().expect("failed to create temp dir");
        let home = tempfile::tempdir().expect("failed to create temp dir");
        let pip = FakePip::new(home.path().join(".local/bin"), 1);

        let result = install_filter_repo(
            &pip,
            false,
            Some(OsString::from(empty.path())),
            Some(home.path().to_path_buf()),
        );

        assert!(matches!(result, Err(Error::FilterRepoMissing)));
        assert!(pip.calls.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn tool_already_on_path_installs_nothing() {
        let bin = tempfile::tempdir().expect("failed to create temp dir");
        write_stub(bin.path());
        let pip = FakePip::new(bin.path().to_path_buf(), 1);

        let result = install_filter_repo(&pip, true, Some(OsString::from(bin.path())), None);

        assert_eq!(result.unwrap(), None);
        assert!(pip.calls.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn user_install_is_tried_before_system_packages() {
        let empty = tempfile::tempdir().expect("failed to create temp dir");
        let home = tempfile::tempdir().expect("failed to create temp dir");
        let local_bin = home.path().join(".local").join("bin");
        let pip = FakePip::new(local_bin.clone(), 2);

        let path = install_filter_repo(
            &pip,
            true,
            Some(OsString::from(empty.path())),
            Some(home.path().to_path_buf()),
        )
        .expect("install failed")
        .expect("PATH override expected");

        let calls = pip.calls.borrow();
        let args: Vec<&[String]> = calls.iter().map(|c| c.args.as_slice()).collect();
        assert_eq!(
            args,
            [
                ["install", "--user", FILTER_REPO],
                ["install", "--break-system-packages", FILTER_REPO],
            ]
        );
        assert!(calls.iter().all(|c| c.program == "pip"));

        let dirs: Vec<PathBuf> = env::split_paths(&path).collect();
        assert_eq!(dirs, [empty.path().to_path_buf(), local_bin]);
    }

    #[test]
    fn failed_installs_report_missing_tool() {
        let empty = tempfile::tempdir().expect("failed to create temp dir");
        let home = tempfile::tempdir().expect("failed to create temp dir");
        let pip = FakePip::new(home.path().join(".local/bin"), 0);

        let result = install_filter_repo(
            &pip,
            true,
            Some(OsString::from(empty.path())),
            Some(home.path().to_path_buf()),
        );

        assert!(matches!(result, Err(Error::FilterRepoMissing)));
        assert_eq!(pip.calls.borrow().len(), INSTALL_COMMANDS.len());
    }
}
