//! Streak derivation over recurrence expectations and completion facts.
//!
//! Day-based habits (`daily`, `specific_weekdays`) count consecutive
//! completed expected days; non-expected days neither extend nor break a
//! run. Quota habits count consecutive satisfied week units instead, with
//! the still-in-progress week judged only once it has fully elapsed.
//!
//! Everything here is a pure scan over already-fetched data; callers may
//! recompute freely on any state change.

use chrono::{Days, NaiveDate};

use crate::completion::{CompletionBackend, CompletionStore};
use crate::habit::{Habit, Schedule};
use crate::recurrence::{active_end, is_expected, WeekStart};

/// Derives current and best streaks for a habit.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreakCalculator {
    /// Week-unit convention for quota habits.
    pub week_start: WeekStart,
}

impl StreakCalculator {
    /// Calculator with the default Sunday-start week unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculator with an explicit week-unit convention.
    pub fn with_week_start(week_start: WeekStart) -> Self {
        Self { week_start }
    }

    /// Length of the streak ending at (or before) `as_of`.
    ///
    /// For day-based habits this walks backward one expected day at a time
    /// and stops at the first expected-but-incomplete day; if `as_of` itself
    /// is expected and incomplete the streak is 0. For quota habits it
    /// counts consecutive satisfied week units ending at the week containing
    /// `as_of`.
    pub fn current_streak<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        as_of: NaiveDate,
    ) -> u32 {
        match habit.schedule {
            Schedule::WeeklyQuota { times_per_week } => {
                self.current_week_streak(habit, completions, as_of, times_per_week)
            }
            _ => self.current_day_streak(habit, completions, as_of),
        }
    }

    /// Longest streak across the habit's entire history, scanned once from
    /// `start_date` to the earlier of end date, archive day, and `today`.
    pub fn best_streak<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        today: NaiveDate,
    ) -> u32 {
        match habit.schedule {
            Schedule::WeeklyQuota { times_per_week } => {
                self.best_week_streak(habit, completions, today, times_per_week)
            }
            _ => self.best_day_streak(habit, completions, today),
        }
    }

    fn current_day_streak<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        as_of: NaiveDate,
    ) -> u32 {
        let end = active_end(habit, as_of);
        if end < habit.start_date {
            return 0;
        }
        let mut streak = 0;
        let mut day = end;
        loop {
            if is_expected(habit, day) {
                if completions.is_completed(&habit.id, day) {
                    streak += 1;
                } else {
                    break;
                }
            }
            match day.pred_opt() {
                Some(prev) if prev >= habit.start_date => day = prev,
                _ => break,
            }
        }
        streak
    }

    fn best_day_streak<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        today: NaiveDate,
    ) -> u32 {
        let end = active_end(habit, today);
        if end < habit.start_date {
            return 0;
        }
        let mut best = 0;
        let mut run = 0;
        let mut day = habit.start_date;
        while day <= end {
            if is_expected(habit, day) {
                if completions.is_completed(&habit.id, day) {
                    run += 1;
                    best = best.max(run);
                } else {
                    run = 0;
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        best
    }

    fn current_week_streak<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        as_of: NaiveDate,
        quota: u8,
    ) -> u32 {
        let end = active_end(habit, as_of);
        if end < habit.start_date {
            return 0;
        }
        let first_week = self.week_start.week_start(habit.start_date);
        let mut week = self.week_start.week_start(end);
        let mut streak = 0;

        // The week containing `end` may still be in progress; it only breaks
        // the streak once fully elapsed. The habit's range ending before
        // `as_of` also concludes its final week.
        let final_week_elapsed = as_of > self.week_start.week_end(end) || end < as_of;
        if self.week_satisfied(habit, completions, week, quota) {
            streak += 1;
        } else if !final_week_elapsed {
            // Skip the in-progress week without breaking.
        } else {
            return 0;
        }

        while let Some(prev) = week.checked_sub_days(Days::new(7)) {
            if prev < first_week {
                break;
            }
            if self.week_satisfied(habit, completions, prev, quota) {
                streak += 1;
                week = prev;
            } else {
                break;
            }
        }
        streak
    }

    fn best_week_streak<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        today: NaiveDate,
        quota: u8,
    ) -> u32 {
        let end = active_end(habit, today);
        if end < habit.start_date {
            return 0;
        }
        let last_week = self.week_start.week_start(end);
        let mut week = self.week_start.week_start(habit.start_date);
        let mut best = 0;
        let mut run = 0;
        while week <= last_week {
            if self.week_satisfied(habit, completions, week, quota) {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
            match week.checked_add_days(Days::new(7)) {
                Some(next) => week = next,
                None => break,
            }
        }
        best
    }

    /// A week unit is satisfied when its eligible completions reach the
    /// quota. Completions outside the habit's active window do not count.
    fn week_satisfied<B: CompletionBackend>(
        &self,
        habit: &Habit,
        completions: &CompletionStore<B>,
        week: NaiveDate,
        quota: u8,
    ) -> bool {
        let count = completions
            .list_in_range(&habit.id, week, week + Days::new(6))
            .into_iter()
            .filter(|&day| is_expected(habit, day))
            .count();
        count >= usize::from(quota)
    }
}
