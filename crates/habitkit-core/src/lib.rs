//! # Habitkit Core Library
//!
//! This library provides the habit and routine engine for the Habitkit
//! life-organization suite: the logic that decides whether a habit is
//! expected on an arbitrary calendar date, tracks completions, derives
//! streaks, and aggregates monthly adherence. The web and mobile clients
//! are thin presentation layers over this crate.
//!
//! ## Architecture
//!
//! - **Recurrence**: a pure predicate deciding whether a date is expected,
//!   with daily, specific-weekday, and weekly-quota schedules
//! - **Completions**: the only mutable state, toggled optimistically with
//!   rollback when the backing store rejects a write
//! - **Streaks & Metrics**: pure scans over recurrence + completions; safe
//!   to recompute on any state change
//! - **Storage**: SQLite-backed habits/completions and TOML configuration
//!
//! ## Key Components
//!
//! - [`Habit`] / [`Schedule`]: validated habit definitions
//! - [`is_expected`]: the recurrence predicate
//! - [`CompletionStore`]: completion facts with an optimistic write path
//! - [`StreakCalculator`] / [`MonthlyMetrics`]: derived statistics
//! - [`ArchivePolicy`]: archival and destructive delete semantics
//! - [`HabitDb`]: the persistence collaborator

pub mod archive;
pub mod completion;
pub mod error;
pub mod habit;
pub mod metrics;
pub mod recurrence;
pub mod reorder;
pub mod storage;
pub mod streak;

pub use archive::{ArchivePolicy, DeleteSummary};
pub use completion::{Completion, CompletionBackend, CompletionStore, MemoryBackend};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use habit::{Habit, Period, Schedule};
pub use metrics::{HabitMonthly, MonthlyMetrics, MonthlyReport};
pub use recurrence::{is_expected, weekday_index, WeekStart};
pub use reorder::{apply_reorder, reorder, Orderable};
pub use storage::{Config, HabitDb};
pub use streak::StreakCalculator;
