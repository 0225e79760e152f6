//! Random commit dates.
//!
//! Generates `count` timestamps inside a [`DateRange`], sorts them, and binds
//! them one-to-one to commits listed oldest first. Because both sides are
//! ordered, an older commit never ends up with a later date than a newer one.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use rand::Rng;
use thiserror::Error;

/// Seconds drawn per day. The draw is inclusive, so the largest offset lands
/// exactly on the following midnight.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// A generated commit timestamp, second resolution, no time zone attached.
pub type AssignedDate = NaiveDateTime;

/// Failures of date generation and correlation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// `start` is not strictly before `end`.
    #[error("start date {start} must be before end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The number of generated dates differs from the number of commits.
    #[error("commit count mismatch: {commits} commits vs {dates} dates")]
    CountMismatch { commits: usize, dates: usize },
}

/// Calendar range to draw commit dates from. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `start >= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateError> {
        if start >= end {
            return Err(DateError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whole days between `start` and `end`.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Midnight of `start`, shifted by whole days and then seconds.
///
/// `second_offset == SECONDS_PER_DAY` yields the next midnight; that edge is
/// kept as is.
pub fn candidate(start: NaiveDate, day_offset: i64, second_offset: i64) -> AssignedDate {
    start.and_time(NaiveTime::MIN)
        + TimeDelta::days(day_offset)
        + TimeDelta::seconds(second_offset)
}

/// Draws `count` dates from `range` using `rng` and returns them sorted
/// ascending. Duplicates are allowed.
pub fn assign_dates<R: Rng + ?Sized>(
    range: &DateRange,
    count: usize,
    rng: &mut R,
) -> Vec<AssignedDate> {
    let span = range.span_days();
    let mut dates: Vec<AssignedDate> = (0..count)
        .map(|_| {
            let day_offset = rng.random_range(0..=span);
            let second_offset = rng.random_range(0..=SECONDS_PER_DAY);
            candidate(range.start, day_offset, second_offset)
        })
        .collect();
    dates.sort();
    dates
}

/// Validates `start < end` and draws `count` dates with the thread RNG.
pub fn assign_dates_between(
    start: NaiveDate,
    end: NaiveDate,
    count: usize,
) -> Result<Vec<AssignedDate>, DateError> {
    let range = DateRange::new(start, end)?;
    Ok(assign_dates(&range, count, &mut rand::rng()))
}

/// Commit identifiers paired with their new dates, oldest commit first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitDateMapping {
    entries: Vec<(String, AssignedDate)>,
}

impl CommitDateMapping {
    pub fn get(&self, commit: &str) -> Option<AssignedDate> {
        self.entries
            .iter()
            .find(|(id, _)| id == commit)
            .map(|(_, date)| *date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AssignedDate)> {
        self.entries.iter().map(|(id, date)| (id.as_str(), *date))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Binds the i-th date to the i-th commit.
///
/// `commits` must be oldest first and `dates` sorted ascending, as returned by
/// [`assign_dates`]. Lengths must match; nothing is truncated or padded.
pub fn correlate<S: AsRef<str>>(
    commits: &[S],
    dates: Vec<AssignedDate>,
) -> Result<CommitDateMapping, DateError> {
    if commits.len() != dates.len() {
        return Err(DateError::CountMismatch {
            commits: commits.len(),
            dates: dates.len(),
        });
    }

    let entries = commits
        .iter()
        .map(|c| c.as_ref().to_string())
        .zip(dates)
        .collect();
    Ok(CommitDateMapping { entries })
}

/// Interprets `date` as wall-clock time in `tz`.
///
/// Times that do not exist in `tz` (a DST gap) are read as UTC instead.
pub fn localize<Tz: TimeZone>(date: AssignedDate, tz: &Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&date).earliest() {
        Some(t) => t,
        None => tz.from_utc_datetime(&date),
    }
}

/// Renders `date` as `@<unix seconds> <+hhmm>`.
///
/// The `@` makes git read the number as epoch seconds whatever its length,
/// which short (pre-1973) and negative timestamps need.
pub fn git_date<Tz: TimeZone>(date: AssignedDate, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    localize(date, tz).format("@%s %z").to_string()
}
