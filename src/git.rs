use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// A fully described external command.
///
/// Kept as plain data so a [`CommandRunner`] can be swapped for a scripted fake
/// in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Shorthand for `git <args>`.
    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git", args)
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// The command line as shown in logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Trimmed stdout on success, otherwise [`Error::Command`] carrying the
    /// trimmed stderr.
    pub fn into_result(self, command: &Invocation) -> Result<String> {
        if self.success() {
            Ok(self.stdout.trim().to_string())
        } else {
            Err(Error::Command {
                command: command.display(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs external commands to completion.
pub trait CommandRunner {
    /// Runs `cmd` and returns its status and output.
    ///
    /// A non-zero exit is not an error here; only a failure to start the
    /// process is.
    fn run(&self, cmd: &Invocation) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
///
/// When `path` is set it replaces `PATH` for every child, which is how a
/// freshly installed `git-filter-repo` is made visible without touching this
/// process's environment.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    path: Option<OsString>,
}

impl SystemRunner {
    pub fn new(path: Option<OsString>) -> Self {
        Self { path }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &Invocation) -> Result<CommandOutput> {
        debug!(command = %cmd.display(), "running");

        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }
        if let Some(path) = &self.path {
            command.env("PATH", path);
        }
        for (key, value) in &cmd.env {
            command.env(key, value);
        }

        let out = command.output().map_err(|source| Error::Spawn {
            command: cmd.display(),
            source,
        })?;

        Ok(CommandOutput {
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}

/// Runs `cmd` and returns its trimmed stdout, failing on a non-zero exit.
pub fn run_output(runner: &dyn CommandRunner, cmd: Invocation) -> Result<String> {
    runner.run(&cmd)?.into_result(&cmd)
}

/// Runs `git config --get <key>` outside any particular repository.
///
/// A missing key or a failing command yields an empty string.
pub fn config_get(runner: &dyn CommandRunner, key: &str) -> String {
    run_output(runner, Invocation::git(["config", "--get", key])).unwrap_or_default()
}

/// Git commands against one repository directory.
pub struct Git<'a> {
    runner: &'a dyn CommandRunner,
    dir: PathBuf,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn CommandRunner, dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        run_output(self.runner, Invocation::git(args).current_dir(&self.dir))
    }

    /// Runs `git clone --bare <url> <dest>` from `work_dir` and returns a
    /// [`Git`] bound to the new clone.
    pub fn clone_bare(
        runner: &'a dyn CommandRunner,
        work_dir: &Path,
        url: &str,
        dest: &Path,
    ) -> Result<Self> {
        let dest_arg = dest.to_string_lossy().into_owned();
        let cmd = Invocation::git(["clone", "--bare", url, dest_arg.as_str()])
            .current_dir(work_dir);
        run_output(runner, cmd)?;
        Ok(Self::new(runner, dest))
    }

    /// Number of commits reachable from any ref.
    ///
    /// Failures and unparsable output count as zero.
    pub fn commit_count(&self) -> usize {
        match self.run(["rev-list", "--count", "--all"]) {
            Ok(s) => s.parse().unwrap_or(0),
            Err(e) => {
                debug!(error = %e, "commit count unavailable");
                0
            }
        }
    }

    /// Every commit reachable from any ref, parents before children.
    pub fn commits_oldest_first(&self) -> Result<Vec<String>> {
        let out = self.run(["log", "--all", "--topo-order", "--reverse", "--format=%H"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// `git filter-repo --commit-callback <body> --force`.
    pub fn filter_repo(&self, callback: &str) -> Result<()> {
        self.run(["filter-repo", "--commit-callback", callback, "--force"])?;
        Ok(())
    }

    /// Rewrites every ref with `git filter-branch`, sourcing `script` as the
    /// env filter.
    pub fn filter_branch_env(&self, script: &Path) -> Result<()> {
        let filter = format!(". {}", shell_quote(&script.to_string_lossy()));
        let cmd = Invocation::git([
            "filter-branch",
            "-f",
            "--env-filter",
            filter.as_str(),
            "--",
            "--all",
        ])
        .current_dir(&self.dir)
        .env("FILTER_BRANCH_SQUELCH_WARNING", "1");
        run_output(self.runner, cmd)?;
        Ok(())
    }

    /// Backup refs left under `refs/original/` by `git filter-branch`.
    pub fn original_refs(&self) -> Result<Vec<String>> {
        let out = self.run(["for-each-ref", "--format=%(refname)", "refs/original/"])?;
        Ok(out.lines().map(str::to_string).collect())
    }

    pub fn delete_ref(&self, name: &str) -> Result<()> {
        self.run(["update-ref", "-d", name])?;
        Ok(())
    }

    pub fn expire_reflog(&self) -> Result<()> {
        self.run(["reflog", "expire", "--expire=now", "--all"])?;
        Ok(())
    }

    pub fn gc(&self) -> Result<()> {
        self.run(["gc", "--prune=now", "--aggressive"])?;
        Ok(())
    }

    pub fn remote_remove(&self, name: &str) -> Result<()> {
        self.run(["remote", "remove", name])?;
        Ok(())
    }

    pub fn remote_add(&self, name: &str, url: &str) -> Result<()> {
        self.run(["remote", "add", name, url])?;
        Ok(())
    }

    pub fn push_mirror(&self, remote: &str) -> Result<()> {
        self.run(["push", "--mirror", remote])?;
        Ok(())
    }
}

/// Wraps `s` in single quotes for `sh`, escaping embedded single quotes.
pub(crate) fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
