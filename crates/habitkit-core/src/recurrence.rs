//! Recurrence rule: decides whether a habit expects a given calendar date.
//!
//! The predicate is pure and shared by the streak and metrics paths:
//! - `daily` habits expect every date inside the active range
//! - `specific_weekdays` habits expect dates whose weekday is listed
//! - `weekly_quota` habits treat every in-range date as *eligible*; whether
//!   the quota was met is judged per week unit by the callers, never here
//!
//! Weekday indices are 0=Sunday through 6=Saturday.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::habit::{Habit, Schedule};

/// First day of a week unit.
///
/// Applied consistently to quota satisfaction, quota streaks, and monthly
/// week-unit counting. Sunday-start is the crate default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Sunday,
    Monday,
}

impl Default for WeekStart {
    fn default() -> Self {
        WeekStart::Sunday
    }
}

impl WeekStart {
    /// The first day of the week unit containing `date`.
    pub fn week_start(&self, date: NaiveDate) -> NaiveDate {
        let offset = match self {
            WeekStart::Sunday => u64::from(date.weekday().num_days_from_sunday()),
            WeekStart::Monday => u64::from(date.weekday().num_days_from_monday()),
        };
        date - Days::new(offset)
    }

    /// The last day (inclusive) of the week unit containing `date`.
    pub fn week_end(&self, date: NaiveDate) -> NaiveDate {
        self.week_start(date) + Days::new(6)
    }
}

/// Weekday index of a date under the crate convention (0=Sunday).
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Whether `habit` expects (or, for quota habits, permits) a completion on
/// `date`.
///
/// Returns false outside `[start_date, end_date]` and for dates after the
/// calendar day of `archived_at`. The archive day itself still counts.
pub fn is_expected(habit: &Habit, date: NaiveDate) -> bool {
    if date < habit.start_date {
        return false;
    }
    if let Some(end) = habit.end_date {
        if date > end {
            return false;
        }
    }
    if let Some(cutoff) = habit.archive_cutoff() {
        if date > cutoff {
            return false;
        }
    }
    match &habit.schedule {
        Schedule::Daily => true,
        Schedule::SpecificWeekdays { weekdays } => weekdays.contains(&weekday_index(date)),
        // Any active day is eligible; the quota is evaluated per week unit.
        Schedule::WeeklyQuota { .. } => true,
    }
}

/// Last day (inclusive) for which history should be scanned: the earliest of
/// `as_of`, the habit's end date, and its archive day.
pub(crate) fn active_end(habit: &Habit, as_of: NaiveDate) -> NaiveDate {
    let mut end = as_of;
    if let Some(e) = habit.end_date {
        end = end.min(e);
    }
    if let Some(cutoff) = habit.archive_cutoff() {
        end = end.min(cutoff);
    }
    end
}
