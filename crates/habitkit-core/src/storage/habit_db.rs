//! SQLite-based storage for habits and completions.
//!
//! Persists the habit definitions and the `(habit_id, date)` completion
//! facts the engine computes over. Implements `CompletionBackend` so a
//! `CompletionStore` can write through to this database.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::completion::{Completion, CompletionBackend};
use crate::error::StoreError;
use crate::habit::{Habit, Period, Schedule};

// === Helper Functions ===

/// Format period for database storage
fn format_period(period: Period) -> &'static str {
    match period {
        Period::Morning => "morning",
        Period::Afternoon => "afternoon",
        Period::Night => "night",
    }
}

/// Parse period from database string
fn parse_period(period_str: &str) -> Period {
    match period_str {
        "afternoon" => Period::Afternoon,
        "night" => Period::Night,
        _ => Period::Morning,
    }
}

/// Decompose a schedule into its storage columns
/// (kind, weekdays JSON, times_per_week).
fn schedule_columns(schedule: &Schedule) -> (&'static str, Option<String>, Option<u8>) {
    match schedule {
        Schedule::Daily => ("daily", None, None),
        Schedule::SpecificWeekdays { weekdays } => {
            let days: Vec<u8> = weekdays.iter().copied().collect();
            (
                "specific_weekdays",
                Some(serde_json::to_string(&days).unwrap_or_else(|_| "[]".into())),
                None,
            )
        }
        Schedule::WeeklyQuota { times_per_week } => ("weekly_quota", None, Some(*times_per_week)),
    }
}

/// Rebuild a schedule from its storage columns
fn parse_schedule(kind: &str, weekdays: Option<&str>, times_per_week: Option<u8>) -> Schedule {
    match kind {
        "specific_weekdays" => {
            let days: Vec<u8> = weekdays
                .and_then(|json| serde_json::from_str(json).ok())
                .unwrap_or_default();
            Schedule::SpecificWeekdays {
                weekdays: days.into_iter().collect(),
            }
        }
        "weekly_quota" => Schedule::WeeklyQuota {
            times_per_week: times_per_week.unwrap_or(1),
        },
        _ => Schedule::Daily,
    }
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a `%Y-%m-%d` calendar date
fn parse_date(date_str: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Build a Habit from a database row (column order per `SELECT_HABIT`)
fn row_to_habit(row: &rusqlite::Row) -> Result<Habit, rusqlite::Error> {
    let period_str: String = row.get(2)?;
    let kind: String = row.get(3)?;
    let weekdays: Option<String> = row.get(4)?;
    let times_per_week: Option<u8> = row.get(5)?;
    let start_date_str: String = row.get(6)?;
    let end_date_str: Option<String> = row.get(7)?;
    let archived_at_str: Option<String> = row.get(8)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    Ok(Habit {
        id: row.get(0)?,
        name: row.get(1)?,
        period: parse_period(&period_str),
        schedule: parse_schedule(&kind, weekdays.as_deref(), times_per_week),
        start_date: parse_date(&start_date_str)?,
        end_date: end_date_str.as_deref().map(parse_date).transpose()?,
        archived_at: archived_at_str.as_deref().map(parse_datetime_fallback),
        created_at: parse_datetime_fallback(&created_at_str),
        updated_at: parse_datetime_fallback(&updated_at_str),
    })
}

const SELECT_HABIT: &str = "SELECT id, name, period, schedule_kind, weekdays, times_per_week,
        start_date, end_date, archived_at, created_at, updated_at
 FROM habits";

/// SQLite database for habit and completion storage.
pub struct HabitDb {
    conn: Connection,
}

impl HabitDb {
    /// Open the database at `~/.config/habitkit/habitkit.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?
            .join("habitkit.db");
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS habits (
                    id              TEXT PRIMARY KEY,
                    name            TEXT NOT NULL,
                    period          TEXT NOT NULL,
                    schedule_kind   TEXT NOT NULL,
                    weekdays        TEXT,
                    times_per_week  INTEGER,
                    start_date      TEXT NOT NULL,
                    end_date        TEXT,
                    archived_at     TEXT,
                    created_at      TEXT NOT NULL,
                    updated_at      TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS completions (
                    habit_id     TEXT NOT NULL,
                    date         TEXT NOT NULL,
                    completed_at TEXT NOT NULL,
                    PRIMARY KEY (habit_id, date)
                );

                CREATE INDEX IF NOT EXISTS idx_completions_habit_date
                    ON completions(habit_id, date);",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    // === Habits ===

    /// Insert a new habit.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        let (kind, weekdays, times_per_week) = schedule_columns(&habit.schedule);
        self.conn.execute(
            "INSERT INTO habits (id, name, period, schedule_kind, weekdays, times_per_week,
                                 start_date, end_date, archived_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                habit.id,
                habit.name,
                format_period(habit.period),
                kind,
                weekdays,
                times_per_week,
                habit.start_date.format("%Y-%m-%d").to_string(),
                habit.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
                habit.archived_at.map(|ts| ts.to_rfc3339()),
                habit.created_at.to_rfc3339(),
                habit.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Update every mutable field of an existing habit.
    ///
    /// # Errors
    /// `StoreError::HabitNotFound` when the id is unknown.
    pub fn update_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        let (kind, weekdays, times_per_week) = schedule_columns(&habit.schedule);
        let updated = self.conn.execute(
            "UPDATE habits SET name = ?2, period = ?3, schedule_kind = ?4, weekdays = ?5,
                               times_per_week = ?6, start_date = ?7, end_date = ?8,
                               archived_at = ?9, updated_at = ?10
             WHERE id = ?1",
            params![
                habit.id,
                habit.name,
                format_period(habit.period),
                kind,
                weekdays,
                times_per_week,
                habit.start_date.format("%Y-%m-%d").to_string(),
                habit.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
                habit.archived_at.map(|ts| ts.to_rfc3339()),
                habit.updated_at.to_rfc3339(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::HabitNotFound(habit.id.clone()));
        }
        Ok(())
    }

    /// Fetch a habit by id.
    pub fn get_habit(&self, id: &str) -> Result<Option<Habit>, StoreError> {
        let habit = self
            .conn
            .query_row(
                &format!("{SELECT_HABIT} WHERE id = ?1"),
                params![id],
                row_to_habit,
            )
            .optional()?;
        Ok(habit)
    }

    /// All habits, archived included, ordered by creation time.
    pub fn list_habits(&self) -> Result<Vec<Habit>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_HABIT} ORDER BY created_at, id"))?;
        let habits = stmt
            .query_map([], row_to_habit)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(habits)
    }

    /// Destructively delete a habit, cascading its completions.
    ///
    /// Returns the number of completions removed.
    ///
    /// # Errors
    /// `StoreError::HabitNotFound` when the id is unknown; other habits are
    /// untouched either way.
    pub fn delete_habit(&self, id: &str) -> Result<usize, StoreError> {
        let completions = self
            .conn
            .execute("DELETE FROM completions WHERE habit_id = ?1", params![id])?;
        let habits = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        if habits == 0 {
            return Err(StoreError::HabitNotFound(id.to_string()));
        }
        Ok(completions)
    }

    // === Completions ===

    /// Upsert the completion for `(habit_id, date)`.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn upsert_completion(
        &self,
        habit_id: &str,
        date: NaiveDate,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO completions (habit_id, date, completed_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(habit_id, date) DO UPDATE SET completed_at = excluded.completed_at",
            params![
                habit_id,
                date.format("%Y-%m-%d").to_string(),
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Remove the completion for `(habit_id, date)`.
    ///
    /// Removing a record that does not exist is not an error.
    pub fn remove_completion(&self, habit_id: &str, date: NaiveDate) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM completions WHERE habit_id = ?1 AND date = ?2",
            params![habit_id, date.format("%Y-%m-%d").to_string()],
        )?;
        Ok(())
    }

    /// Ascending completions for a habit within `[from, to]`.
    pub fn list_completions(
        &self,
        habit_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Completion>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_id, date, completed_at FROM completions
             WHERE habit_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date",
        )?;
        let completions = stmt
            .query_map(
                params![
                    habit_id,
                    from.format("%Y-%m-%d").to_string(),
                    to.format("%Y-%m-%d").to_string(),
                ],
                |row| {
                    let date_str: String = row.get(1)?;
                    let completed_at_str: String = row.get(2)?;
                    Ok(Completion {
                        habit_id: row.get(0)?,
                        date: parse_date(&date_str)?,
                        completed_at: parse_datetime_fallback(&completed_at_str),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }

    /// Every stored completion, for hydrating a `CompletionStore`.
    pub fn load_all_completions(&self) -> Result<Vec<Completion>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_id, date, completed_at FROM completions ORDER BY habit_id, date",
        )?;
        let completions = stmt
            .query_map([], |row| {
                let date_str: String = row.get(1)?;
                let completed_at_str: String = row.get(2)?;
                Ok(Completion {
                    habit_id: row.get(0)?,
                    date: parse_date(&date_str)?,
                    completed_at: parse_datetime_fallback(&completed_at_str),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }
}

impl CompletionBackend for HabitDb {
    fn upsert(
        &mut self,
        habit_id: &str,
        date: NaiveDate,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.upsert_completion(habit_id, date, completed_at)
    }

    fn remove(&mut self, habit_id: &str, date: NaiveDate) -> Result<(), StoreError> {
        self.remove_completion(habit_id, date)
    }

    fn remove_all_for(&mut self, habit_id: &str) -> Result<usize, StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM completions WHERE habit_id = ?1",
            params![habit_id],
        )?;
        Ok(removed)
    }
}
