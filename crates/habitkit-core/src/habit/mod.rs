//! Habit domain types and validation.
//!
//! A habit couples a display identity (name, period grouping) with a
//! recurrence schedule and an active date range. Schedules are encoded as a
//! tagged enum so that a habit can never carry both specific weekdays and a
//! weekly quota at the same time.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Time-of-day grouping used by the presentation layer.
///
/// Has no effect on scheduling; two habits in different periods with the
/// same schedule generate identical expectations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Morning routine block
    Morning,
    /// Afternoon routine block
    Afternoon,
    /// Night routine block
    Night,
}

impl Default for Period {
    fn default() -> Self {
        Period::Morning
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Morning => write!(f, "morning"),
            Period::Afternoon => write!(f, "afternoon"),
            Period::Night => write!(f, "night"),
        }
    }
}

/// Recurrence schedule for a habit.
///
/// Weekday indices are 0=Sunday through 6=Saturday throughout the crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// Expected every day the habit is active.
    Daily,
    /// Expected only on the listed weekdays (0=Sun ... 6=Sat).
    SpecificWeekdays { weekdays: BTreeSet<u8> },
    /// Eligible every active day; success is judged per week against
    /// a target count of 1-7 completions.
    WeeklyQuota { times_per_week: u8 },
}

impl Schedule {
    /// Build a specific-weekdays schedule from raw indices.
    ///
    /// # Errors
    /// Returns an error if the set is empty or any index exceeds 6.
    pub fn specific_weekdays<I>(weekdays: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = u8>,
    {
        let weekdays: BTreeSet<u8> = weekdays.into_iter().collect();
        let schedule = Schedule::SpecificWeekdays { weekdays };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Build a weekly-quota schedule.
    ///
    /// # Errors
    /// Returns an error if `times_per_week` is outside 1-7.
    pub fn weekly_quota(times_per_week: u8) -> Result<Self, ValidationError> {
        let schedule = Schedule::WeeklyQuota { times_per_week };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Validate the schedule payload.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Schedule::Daily => Ok(()),
            Schedule::SpecificWeekdays { weekdays } => {
                if weekdays.is_empty() {
                    return Err(ValidationError::EmptyWeekdays);
                }
                if let Some(&bad) = weekdays.iter().find(|&&d| d > 6) {
                    return Err(ValidationError::WeekdayOutOfRange(bad));
                }
                Ok(())
            }
            Schedule::WeeklyQuota { times_per_week } => {
                if !(1..=7).contains(times_per_week) {
                    return Err(ValidationError::QuotaOutOfRange(*times_per_week));
                }
                Ok(())
            }
        }
    }

    /// Whether success for this schedule is judged per week rather than
    /// per day.
    pub fn is_weekly_quota(&self) -> bool {
        matches!(self, Schedule::WeeklyQuota { .. })
    }
}

/// A tracked habit with its recurrence schedule and active range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    /// Opaque unique identifier, immutable after creation.
    pub id: String,
    pub name: String,
    pub period: Period,
    pub schedule: Schedule,
    /// First day (inclusive) on which expectations exist.
    pub start_date: NaiveDate,
    /// Last day (inclusive) of the active range; `None` means open-ended.
    pub end_date: Option<NaiveDate>,
    /// Set when the habit is archived. Expectations stop after the calendar
    /// day of this timestamp; history stays queryable.
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    /// Create a new habit, validating name, schedule, and date range.
    ///
    /// # Errors
    /// Returns an error when the name is empty, the schedule payload is
    /// invalid, or `end_date` precedes `start_date`.
    pub fn new(
        name: impl Into<String>,
        period: Period,
        schedule: Schedule,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_fields(&name, &schedule, start_date, end_date)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            period,
            schedule,
            start_date,
            end_date,
            archived_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the schedule fields.
    ///
    /// Only affects future expectation generation; past completions are
    /// never rewritten.
    ///
    /// # Errors
    /// Returns an error when the new combination fails validation.
    pub fn update_schedule(
        &mut self,
        schedule: Schedule,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<(), ValidationError> {
        validate_fields(&self.name, &schedule, start_date, end_date)?;
        self.schedule = schedule;
        self.start_date = start_date;
        self.end_date = end_date;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Rename the habit.
    ///
    /// # Errors
    /// Returns an error when the new name is empty.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.name = name;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Whether the habit is currently archived.
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// The calendar day (UTC) after which archival suppresses expectations.
    ///
    /// The archive day itself still generates expectations.
    pub fn archive_cutoff(&self) -> Option<NaiveDate> {
        self.archived_at.map(|ts| ts.date_naive())
    }
}

fn validate_fields(
    name: &str,
    schedule: &Schedule,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    schedule.validate()?;
    if let Some(end) = end_date {
        if end < start_date {
            return Err(ValidationError::EndBeforeStart {
                start: start_date,
                end,
            });
        }
    }
    Ok(())
}
