//! Monthly adherence metrics: per-habit percentages, cross-habit averages,
//! and perfect-day counts.
//!
//! Day-based habits compare completed expected days against expected days up
//! to `today`. Quota habits compare capped weekly completions against
//! `times_per_week x overlapping week units`, so over-completing one week
//! can never push a month past 100%.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::completion::{CompletionBackend, CompletionStore};
use crate::habit::{Habit, Schedule};
use crate::recurrence::{active_end, is_expected, WeekStart};

/// Monthly adherence for a single habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitMonthly {
    pub habit_id: String,
    pub habit_name: String,
    /// Expected completions for the month (days, or quota x week units).
    pub expected: u32,
    /// Counted completions (capped per week for quota habits).
    pub completed: u32,
    /// `completed / expected * 100`, or 0 when nothing was expected.
    pub percentage: f64,
}

/// Complete monthly report across a set of habits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub per_habit: Vec<HabitMonthly>,
    /// Mean percentage over habits active in the month; habits with zero
    /// expectations are excluded, not counted as 0%.
    pub average: f64,
    /// Days on which every expected habit was completed.
    pub perfect_days: u32,
}

/// Computes monthly adherence metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthlyMetrics {
    /// Week-unit convention for quota habits.
    pub week_start: WeekStart,
}

impl MonthlyMetrics {
    /// Aggregator with the default Sunday-start week unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator with an explicit week-unit convention.
    pub fn with_week_start(week_start: WeekStart) -> Self {
        Self { week_start }
    }

    /// Adherence percentage in `[0, 100]` for one habit in one month.
    ///
    /// Only dates up to `today` count as expected; 0.0 when the habit has no
    /// expectations that month.
    pub fn monthly_completion<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> f64 {
        let (expected, completed) = self.monthly_counts(habit, completions, year, month, today);
        percentage(completed, expected)
    }

    /// Mean adherence across `habits` for the month.
    ///
    /// Habits with zero expectations in the month are excluded from the
    /// average rather than dragging it toward 0.
    pub fn monthly_average<B: CompletionBackend>(
        &self,
        habits: &[Habit],
        completions: &CompletionStore<B>,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> f64 {
        let mut sum = 0.0;
        let mut active = 0u32;
        for habit in habits {
            let (expected, completed) = self.monthly_counts(habit, completions, year, month, today);
            if expected > 0 {
                sum += percentage(completed, expected);
                active += 1;
            }
        }
        if active == 0 {
            0.0
        } else {
            sum / f64::from(active)
        }
    }

    /// Number of days in the month (up to `today`) where at least one habit
    /// was expected and every expected habit was completed.
    pub fn perfect_days<B: CompletionBackend>(
        &self,
        habits: &[Habit],
        completions: &CompletionStore<B>,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> u32 {
        let Some((month_start, month_end)) = month_range(year, month) else {
            return 0;
        };
        let mut count = 0;
        let mut day = month_start;
        while day <= month_end.min(today) {
            let mut any_expected = false;
            let mut all_completed = true;
            for habit in habits {
                if is_expected(habit, day) {
                    any_expected = true;
                    if !completions.is_completed(&habit.id, day) {
                        all_completed = false;
                        break;
                    }
                }
            }
            if any_expected && all_completed {
                count += 1;
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        count
    }

    /// Full report for the month: per-habit rows, average, perfect days.
    pub fn monthly_report<B: CompletionBackend>(
        &self,
        habits: &[Habit],
        completions: &CompletionStore<B>,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> MonthlyReport {
        let per_habit: Vec<HabitMonthly> = habits
            .iter()
            .map(|habit| {
                let (expected, completed) =
                    self.monthly_counts(habit, completions, year, month, today);
                HabitMonthly {
                    habit_id: habit.id.clone(),
                    habit_name: habit.name.clone(),
                    expected,
                    completed,
                    percentage: percentage(completed, expected),
                }
            })
            .collect();

        MonthlyReport {
            year,
            month,
            average: self.monthly_average(habits, completions, year, month, today),
            perfect_days: self.perfect_days(habits, completions, year, month, today),
            per_habit,
        }
    }

    /// Expected/completed counts for one habit in one month.
    fn monthly_counts<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> (u32, u32) {
        let Some((month_start, month_end)) = month_range(year, month) else {
            return (0, 0);
        };
        match habit.schedule {
            Schedule::WeeklyQuota { times_per_week } => self.quota_counts(
                habit,
                completions,
                month_start,
                month_end,
                today,
                times_per_week,
            ),
            _ => self.day_counts(habit, completions, month_start, month_end, today),
        }
    }

    fn day_counts<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        month_start: NaiveDate,
        month_end: NaiveDate,
        today: NaiveDate,
    ) -> (u32, u32) {
        let mut expected = 0;
        let mut completed = 0;
        let mut day = month_start;
        let end = month_end.min(today);
        while day <= end {
            if is_expected(habit, day) {
                expected += 1;
                if completions.is_completed(&habit.id, day) {
                    completed += 1;
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        (expected, completed)
    }

    fn quota_counts<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        month_start: NaiveDate,
        month_end: NaiveDate,
        today: NaiveDate,
        quota: u8,
    ) -> (u32, u32) {
        // Active span of the habit inside this month.
        let span_start = month_start.max(habit.start_date);
        let span_end = month_end.min(active_end(habit, today));
        if span_start > span_end {
            return (0, 0);
        }

        let mut expected = 0u32;
        let mut completed = 0u32;
        let mut week = self.week_start.week_start(span_start);
        while week <= span_end {
            expected += u32::from(quota);
            // In-month eligible completions for this week unit, capped at
            // the quota so one heavy week cannot inflate the month.
            let week_end = week + Days::new(6);
            let in_week = completions
                .list_in_range(&habit.id, week.max(span_start), week_end.min(span_end))
                .into_iter()
                .filter(|&day| is_expected(habit, day))
                .count() as u32;
            completed += in_week.min(u32::from(quota));
            match week.checked_add_days(Days::new(7)) {
                Some(next) => week = next,
                None => break,
            }
        }
        (expected, completed)
    }
}

fn percentage(completed: u32, expected: u32) -> f64 {
    if expected == 0 {
        0.0
    } else {
        f64::from(completed) / f64::from(expected) * 100.0
    }
}

/// First and last day of a month, or `None` for an invalid year/month pair.
fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next_month.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::Period;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(start: NaiveDate) -> Habit {
        Habit::new("Journal", Period::Night, Schedule::Daily, start, None).unwrap()
    }

    fn complete(store: &mut CompletionStore, habit: &Habit, days: &[NaiveDate]) {
        for &day in days {
            store.toggle(&habit.id, day).unwrap();
        }
    }

    #[test]
    fn daily_percentage_counts_days_up_to_today() {
        let habit = daily(date(2025, 3, 1));
        let mut store = CompletionStore::in_memory();
        complete(
            &mut store,
            &habit,
            &[date(2025, 3, 1), date(2025, 3, 2), date(2025, 3, 4)],
        );

        let metrics = MonthlyMetrics::new();
        // 4 expected days (03-01..04), 3 completed
        let pct = metrics.monthly_completion(&habit, &store, 2025, 3, date(2025, 3, 4));
        assert!((pct - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inactive_month_yields_zero_percent() {
        let habit = daily(date(2025, 6, 1));
        let store = CompletionStore::in_memory();
        let metrics = MonthlyMetrics::new();
        let pct = metrics.monthly_completion(&habit, &store, 2025, 3, date(2025, 3, 31));
        assert_eq!(pct, 0.0);
    }

    #[test]
    fn quota_over_completion_caps_per_week() {
        // Quota 3; week one gets 5 completions, week two gets 0.
        // Habit spans exactly two Sunday-start week units.
        let habit = Habit::new(
            "Swim",
            Period::Morning,
            Schedule::weekly_quota(3).unwrap(),
            date(2025, 3, 2), // Sunday
            Some(date(2025, 3, 15)), // Saturday, end of second week
        )
        .unwrap();
        let mut store = CompletionStore::in_memory();
        complete(
            &mut store,
            &habit,
            &[
                date(2025, 3, 2),
                date(2025, 3, 3),
                date(2025, 3, 4),
                date(2025, 3, 5),
                date(2025, 3, 6),
            ],
        );

        let metrics = MonthlyMetrics::new();
        // expected = 3 * 2 = 6, completed caps at 3 + 0 = 3 -> 50%
        let pct = metrics.monthly_completion(&habit, &store, 2025, 3, date(2025, 3, 31));
        assert!((pct - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_never_exceeds_bounds() {
        let habit = daily(date(2025, 3, 1));
        let mut store = CompletionStore::in_memory();
        let mut day = date(2025, 3, 1);
        while day <= date(2025, 3, 31) {
            store.toggle(&habit.id, day).unwrap();
            day = day.succ_opt().unwrap();
        }

        let metrics = MonthlyMetrics::new();
        let pct = metrics.monthly_completion(&habit, &store, 2025, 3, date(2025, 3, 31));
        assert!((0.0..=100.0).contains(&pct));
        assert!((pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn archived_habit_keeps_history_in_expected_count() {
        // Archived on 03-10: expectations cover 03-01 through the archive
        // day, then stop.
        let mut habit = daily(date(2025, 3, 1));
        habit.archived_at = Some(Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap());
        let mut store = CompletionStore::in_memory();
        let mut day = date(2025, 3, 1);
        while day <= date(2025, 3, 10) {
            store.toggle(&habit.id, day).unwrap();
            day = day.succ_opt().unwrap();
        }

        let metrics = MonthlyMetrics::new();
        assert!(!is_expected(&habit, date(2025, 3, 15)));
        let pct = metrics.monthly_completion(&habit, &store, 2025, 3, date(2025, 3, 31));
        // 10 expected days (through the archive day), all completed
        assert!((pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_excludes_habits_without_expectations() {
        let active = daily(date(2025, 3, 1));
        let dormant = daily(date(2025, 6, 1)); // not active in March
        let mut store = CompletionStore::in_memory();
        complete(&mut store, &active, &[date(2025, 3, 1), date(2025, 3, 2)]);

        let metrics = MonthlyMetrics::new();
        let avg = metrics.monthly_average(
            &[active, dormant],
            &store,
            2025,
            3,
            date(2025, 3, 2),
        );
        // Only the active habit participates: 2/2 -> 100%
        assert!((avg - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_over_no_active_habits_is_zero() {
        let dormant = daily(date(2025, 6, 1));
        let store = CompletionStore::in_memory();
        let metrics = MonthlyMetrics::new();
        let avg = metrics.monthly_average(&[dormant], &store, 2025, 3, date(2025, 3, 31));
        assert_eq!(avg, 0.0);
    }

    #[test]
    fn perfect_days_require_every_expected_habit() {
        let a = daily(date(2025, 3, 1));
        // Mon/Wed/Fri habit; 03-03 is a Monday
        let b = Habit::new(
            "Gym",
            Period::Afternoon,
            Schedule::specific_weekdays([1, 3, 5]).unwrap(),
            date(2025, 3, 1),
            None,
        )
        .unwrap();
        let mut store = CompletionStore::in_memory();
        // 03-01 (Sat): only A expected, completed -> perfect
        // 03-02 (Sun): only A expected, missed -> not perfect
        // 03-03 (Mon): both expected, only A completed -> not perfect
        // 03-04 (Tue): only A expected, completed -> perfect
        complete(
            &mut store,
            &a,
            &[date(2025, 3, 1), date(2025, 3, 3), date(2025, 3, 4)],
        );

        let metrics = MonthlyMetrics::new();
        let habits = vec![a, b];
        assert_eq!(
            metrics.perfect_days(&habits, &store, 2025, 3, date(2025, 3, 4)),
            2
        );
    }

    #[test]
    fn day_with_zero_expected_habits_is_never_perfect() {
        let dormant = daily(date(2025, 6, 1));
        let store = CompletionStore::in_memory();
        let metrics = MonthlyMetrics::new();
        assert_eq!(
            metrics.perfect_days(&[dormant], &store, 2025, 3, date(2025, 3, 31)),
            0
        );
    }

    #[test]
    fn monthly_report_round_trips_through_json() {
        let habit = daily(date(2025, 3, 1));
        let mut store = CompletionStore::in_memory();
        complete(&mut store, &habit, &[date(2025, 3, 1)]);

        let metrics = MonthlyMetrics::new();
        let report = metrics.monthly_report(&[habit], &store, 2025, 3, date(2025, 3, 2));
        assert_eq!(report.per_habit.len(), 1);
        assert_eq!(report.per_habit[0].expected, 2);
        assert_eq!(report.per_habit[0].completed, 1);

        let json = serde_json::to_string(&report).unwrap();
        let decoded: MonthlyReport = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.per_habit[0].completed, 1);
    }
}
