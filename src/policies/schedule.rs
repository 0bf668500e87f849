//! # Schedule provider interface and descriptors.
//!
//! The trigger-expression engine is an external collaborator: the runtime
//! only needs "give me future fire instants, minus excluded days". That
//! contract is [`FireSchedule`]; the two in-crate sources are
//! [`CronFireSchedule`] (delegating to the `cron` crate) and
//! [`TriggerSpec`] (a fixed-interval trigger with an optional repeat
//! count).
//!
//! [`ExclusionCalendar`] models business holidays: a fire instant landing
//! on an excluded date is skipped entirely and the next candidate is used.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::TaskError;

/// Candidates examined while skipping excluded days before the scan gives
/// up. Bounds the search when a calendar excludes every candidate.
const CALENDAR_SCAN_LIMIT: usize = 10_000;

/// Source of future fire instants for a schedule-backed task.
///
/// Implementations are consulted once per slot run: the returned iterator
/// yields fire instants in ascending order starting at (or after)
/// `origin`.
pub trait FireSchedule: Send + Sync + 'static {
    /// Fire instants from `origin` onwards, ascending.
    fn fires_from<'a>(
        &'a self,
        origin: DateTime<Utc>,
    ) -> Box<dyn Iterator<Item = DateTime<Utc>> + Send + 'a>;
}

/// Cron-backed fire schedule.
///
/// Parses eagerly so a bad expression surfaces as
/// [`TaskError::InvalidConfig`] at the factory, not at `start()`.
/// Expressions use the seconds-resolution format of the `cron` crate
/// (`sec min hour day-of-month month day-of-week [year]`).
#[derive(Debug)]
pub(crate) struct CronFireSchedule {
    schedule: cron::Schedule,
}

impl CronFireSchedule {
    pub(crate) fn parse(expr: &str) -> Result<Self, TaskError> {
        let schedule = cron::Schedule::from_str(expr)
            .map_err(|e| TaskError::invalid(format!("bad cron expression [{expr}]: {e}")))?;
        Ok(Self { schedule })
    }
}

impl FireSchedule for CronFireSchedule {
    fn fires_from<'a>(
        &'a self,
        origin: DateTime<Utc>,
    ) -> Box<dyn Iterator<Item = DateTime<Utc>> + Send + 'a> {
        Box::new(self.schedule.after(&origin))
    }
}

/// Interval-trigger descriptor: fire at `origin`, then every `interval`,
/// optionally stopping after a total fire count.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tasklane::TriggerSpec;
///
/// // fire 5 times, 250ms apart
/// let t = TriggerSpec::every(Duration::from_millis(250)).with_count(5);
/// assert_eq!(t.count(), Some(5));
/// ```
#[derive(Clone, Debug)]
pub struct TriggerSpec {
    interval: Duration,
    count: Option<u32>,
}

impl TriggerSpec {
    /// Repeats forever with the given interval between fires.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            count: None,
        }
    }

    /// Bounds the total number of fires.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// The interval between fires.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total fire count, `None` = repeat forever.
    pub fn count(&self) -> Option<u32> {
        self.count
    }
}

impl FireSchedule for TriggerSpec {
    fn fires_from<'a>(
        &'a self,
        origin: DateTime<Utc>,
    ) -> Box<dyn Iterator<Item = DateTime<Utc>> + Send + 'a> {
        let step = chrono::Duration::from_std(self.interval)
            .unwrap_or(chrono::Duration::MAX);
        let fires = std::iter::successors(Some(origin), move |at| at.checked_add_signed(step));
        match self.count {
            Some(n) => Box::new(fires.take(n as usize)),
            None => Box::new(fires),
        }
    }
}

/// Whole-day exclusion calendar (business holidays).
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tasklane::ExclusionCalendar;
///
/// let holidays = ExclusionCalendar::from_dates([
///     NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date"),
/// ]);
/// assert!(holidays.is_excluded(NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date")));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ExclusionCalendar {
    days: HashSet<NaiveDate>,
}

impl ExclusionCalendar {
    /// An empty calendar: nothing is excluded.
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds a calendar from a set of excluded dates.
    pub fn from_dates(days: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    /// Whether the given date is excluded.
    pub fn is_excluded(&self, day: NaiveDate) -> bool {
        self.days.contains(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Advances `fires` to the next instant not landing on an excluded day.
///
/// Gives up after [`CALENDAR_SCAN_LIMIT`] candidates so a calendar that
/// excludes every candidate cannot spin the slot forever.
pub(crate) fn next_included(
    fires: &mut dyn Iterator<Item = DateTime<Utc>>,
    calendar: &ExclusionCalendar,
) -> Option<DateTime<Utc>> {
    if calendar.is_empty() {
        return fires.next();
    }
    fires
        .take(CALENDAR_SCAN_LIMIT)
        .find(|at| !calendar.is_excluded(at.date_naive()))
}
