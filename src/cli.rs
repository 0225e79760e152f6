use crate::{
    banner::print_summary,
    dates::parse_date,
    error::{Error, Result},
    filters::{Replacement, push_replacement},
    git::{self, SystemRunner},
    prompt::{self, AuthorDefaults, Draft},
    tooling,
    transfer::{self, DEFAULT_REMOTE, TransferOptions},
};

use chrono::NaiveDate;
use clap::Parser;
use console::style;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Rewrite a repository's commit authors, messages and dates, then mirror it
/// to a new remote.
#[derive(Parser, Debug)]
#[command(name = "git-transfer", version, about, long_about = None)]
struct Args {
    /// URL of the repository to copy
    #[arg(long, env = "GIT_TRANSFER_OLD_URL")]
    old_url: Option<String>,

    /// URL of the repository to mirror-push into
    #[arg(long, env = "GIT_TRANSFER_NEW_URL")]
    new_url: Option<String>,

    /// New author and committer name
    #[arg(long, env = "GIT_TRANSFER_NAME")]
    name: Option<String>,

    /// New author and committer email
    #[arg(long, env = "GIT_TRANSFER_EMAIL")]
    email: Option<String>,

    /// First day for randomized commit dates (YYYY-MM-DD)
    #[arg(long, env = "GIT_TRANSFER_START_DATE", value_parser = date_arg)]
    start_date: Option<NaiveDate>,

    /// Last day for randomized commit dates (YYYY-MM-DD)
    #[arg(long, env = "GIT_TRANSFER_END_DATE", value_parser = date_arg)]
    end_date: Option<NaiveDate>,

    /// Replace text in commit messages, as OLD=NEW (repeatable)
    #[arg(long = "replace", value_name = "OLD=NEW", value_parser = replacement_arg)]
    replacements: Vec<Replacement>,

    /// Directory the temporary bare clone is created in [default: current directory]
    #[arg(long, env = "GIT_TRANSFER_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Name of the remote added for the new repository
    #[arg(long, env = "GIT_TRANSFER_REMOTE", default_value = DEFAULT_REMOTE)]
    remote_name: String,

    /// Keep the bare clone after the transfer
    #[arg(long)]
    keep_clone: bool,

    /// Fail instead of installing git-filter-repo with pip when it is missing
    #[arg(long)]
    no_install: bool,

    /// Do not ask anything; take values from flags and git config and skip confirmation
    #[arg(short, long)]
    yes: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("`{s}` is not a YYYY-MM-DD date"))
}

/// Parses `OLD=NEW`, splitting at the first `=`. `OLD` may not be empty.
pub(crate) fn replacement_arg(s: &str) -> std::result::Result<Replacement, String> {
    match s.split_once('=') {
        Some((from, _)) if from.is_empty() => {
            Err("text to replace must not be empty".to_string())
        }
        Some((from, to)) => Ok(Replacement {
            from: from.to_string(),
            to: to.to_string(),
        }),
        None => Err(format!("`{s}` is not in OLD=NEW form")),
    }
}

/// Installs the `tracing` subscriber: `info` by default, `debug` with
/// `--verbose`, `RUST_LOG` wins over both.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_error(err: &Error) {
    eprintln!("{}", style(format!("Error: {err}")).red().bold());
}

/// Turns parsed flags into a prompt draft. Repeated `--replace` flags with
/// the same search text keep the last replacement.
fn draft_from(args: &Args) -> Draft {
    let mut replacements = Vec::new();
    for r in &args.replacements {
        push_replacement(&mut replacements, r.clone());
    }
    Draft {
        old_url: args.old_url.clone(),
        new_url: args.new_url.clone(),
        name: args.name.clone(),
        email: args.email.clone(),
        start_date: args.start_date,
        end_date: args.end_date,
        replacements,
    }
}

fn options_from(args: &Args, work_dir: PathBuf) -> TransferOptions {
    TransferOptions {
        work_dir,
        remote_name: args.remote_name.clone(),
        keep_clone: args.keep_clone,
        install_filter_repo: !args.no_install,
    }
}

/// Everything after argument parsing. `Ok(false)` means the user cancelled.
fn run(args: &Args) -> Result<bool> {
    tooling::require_git()?;

    let system = SystemRunner::default();
    let defaults = AuthorDefaults {
        name: git::config_get(&system, "user.name"),
        email: git::config_get(&system, "user.email"),
    };

    let interactive = !args.yes;
    let mut strings = prompt::DialoguerStringPrompter;
    let mut confirms = prompt::DialoguerConfirmPrompter;
    let request = prompt::complete_request(
        draft_from(args),
        &defaults,
        interactive,
        &mut strings,
        &mut confirms,
    )?;

    print_summary(&request);

    if interactive && !prompt::confirm_transfer(&mut confirms)? {
        return Ok(false);
    }

    let work_dir = match &args.work_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let options = options_from(args, work_dir);

    let path = tooling::ensure_filter_repo(&system, options.install_filter_repo)?;
    let runner = SystemRunner::new(path);

    let report = transfer::transfer(&runner, &request, &options, &mut rand::rng())?;

    println!(
        "{}",
        style("✅ Repository transfer complete!").green().bold()
    );
    if request.date_range.is_some() {
        println!(
            "{}",
            style(format!(
                "Re-dated {} of {} commits.",
                report.dated_commits, report.commits
            ))
            .green()
        );
    }
    Ok(true)
}

/// Main CLI entry point for `git-transfer`.
///
/// This function:
/// 1. Parses flags (and their environment fallbacks).
/// 2. Initializes logging.
/// 3. Verifies that `git` is installed.
/// 4. Prompts for whatever the flags left out, with author defaults from `git config`.
/// 5. Shows a summary and asks for confirmation.
/// 6. Makes sure `git-filter-repo` is available, installing it if allowed.
/// 7. Runs the transfer.
///
/// # Exit Codes
///
/// * `0` – Transfer completed, or the user cancelled.
/// * Non-zero – Invalid input or a failing external command.
pub fn entry() -> std::result::Result<i32, ()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => Ok(0),
        Ok(false) => {
            println!("{}", style("Transfer cancelled.").yellow().bold());
            Ok(0)
        }
        Err(e) => {
            print_error(&e);
            Err(())
        }
    }
}
