//! Scripts handed to the history-rewriting tools.
//!
//! `git filter-repo` takes a Python function body through `--commit-callback`;
//! `git filter-branch` takes a shell snippet through `--env-filter`. Both are
//! generated here as plain strings so they can be inspected in tests.

use std::fmt;

use chrono::TimeZone;

use crate::dates::{CommitDateMapping, git_date};

/// New author and committer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Literal text replacement applied to every commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

/// Adds `replacement`, overwriting an earlier entry with the same `from` text
/// in place.
pub fn push_replacement(list: &mut Vec<Replacement>, replacement: Replacement) {
    match list.iter_mut().find(|r| r.from == replacement.from) {
        Some(existing) => existing.to = replacement.to,
        None => list.push(replacement),
    }
}

/// Quotes `s` as a single-quoted Python string literal.
///
/// Control characters and the Unicode line/paragraph separators are written
/// as `\xNN` or `\uNNNN` escapes so the literal always stays on one line.
pub(crate) fn py_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() || c == '\u{2028}' || c == '\u{2029}' => {
                let code = u32::from(c);
                if code <= 0xff {
                    out.push_str(&format!("\\x{code:02x}"));
                } else {
                    out.push_str(&format!("\\u{code:04x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Builds the `--commit-callback` body setting author and committer to
/// `author` and applying `replacements` to the message, in order.
pub fn commit_callback(author: &Author, replacements: &[Replacement]) -> String {
    let mut lines = vec![
        format!(
            "commit.author_name = commit.committer_name = {}.encode('utf-8')",
            py_str(&author.name)
        ),
        format!(
            "commit.author_email = commit.committer_email = {}.encode('utf-8')",
            py_str(&author.email)
        ),
    ];

    if !replacements.is_empty() {
        lines.push("message = commit.message.decode('utf-8', errors='replace')".to_string());
        for r in replacements {
            lines.push(format!(
                "message = message.replace({}, {})",
                py_str(&r.from),
                py_str(&r.to)
            ));
        }
        lines.push("commit.message = message.encode('utf-8')".to_string());
    }

    lines.join("\n")
}

/// Builds the `--env-filter` snippet that sets author and committer dates for
/// every commit in `mapping`. Commits not in the mapping keep their dates.
pub fn env_filter_script<Tz: TimeZone>(mapping: &CommitDateMapping, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    let mut script = String::from("case \"$GIT_COMMIT\" in\n");
    for (commit, date) in mapping.iter() {
        let when = git_date(date, tz);
        script.push_str(&format!(
            "  {commit}) export GIT_AUTHOR_DATE=\"{when}\" GIT_COMMITTER_DATE=\"{when}\" ;;\n"
        ));
    }
    script.push_str("esac\n");
    script
}
