//! Completion tracking: per-habit, per-date completion facts.
//!
//! `CompletionStore` is the only mutable state in the engine. It holds the
//! in-memory view the pure calculators read from, plus a backend seam for
//! persistence. Writes are optimistic: the local flip happens first, the
//! backend write follows, and a failed write reverts the flip before the
//! error is surfaced. There is no retry; the caller re-triggers the action.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A recorded completion for one habit on one calendar day.
///
/// `(habit_id, date)` is the composite key; at most one record exists per
/// pair. `completed_at` records the toggle moment for auditing only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Completion {
    pub habit_id: String,
    pub date: NaiveDate,
    pub completed_at: DateTime<Utc>,
}

/// Persistence seam for completion writes.
///
/// `storage::HabitDb` implements this over SQLite; tests substitute failing
/// or no-op backends to exercise the optimistic-revert contract.
pub trait CompletionBackend {
    /// Persist a completion for `(habit_id, date)`.
    fn upsert(
        &mut self,
        habit_id: &str,
        date: NaiveDate,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Remove the completion for `(habit_id, date)`. Removing a record that
    /// does not exist is not an error.
    fn remove(&mut self, habit_id: &str, date: NaiveDate) -> Result<(), StoreError>;

    /// Remove every completion for `habit_id`, returning the removed count.
    fn remove_all_for(&mut self, habit_id: &str) -> Result<usize, StoreError>;
}

/// Backend that keeps no state of its own; every write succeeds.
///
/// Used when the engine runs over already-fetched data and persistence is
/// handled elsewhere, and as the default in tests.
#[derive(Debug, Default)]
pub struct MemoryBackend;

impl CompletionBackend for MemoryBackend {
    fn upsert(
        &mut self,
        _habit_id: &str,
        _date: NaiveDate,
        _completed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    fn remove(&mut self, _habit_id: &str, _date: NaiveDate) -> Result<(), StoreError> {
        Ok(())
    }

    fn remove_all_for(&mut self, _habit_id: &str) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// Mutable store of completion facts with an optimistic write path.
///
/// Ordered maps keep range queries ascending and restartable without any
/// cursor state. The backend type defaults to the no-op [`MemoryBackend`];
/// production code hands in a `storage::HabitDb`.
pub struct CompletionStore<B: CompletionBackend = MemoryBackend> {
    completions: BTreeMap<String, BTreeMap<NaiveDate, DateTime<Utc>>>,
    backend: B,
}

impl CompletionStore<MemoryBackend> {
    /// Store over the no-op memory backend.
    pub fn in_memory() -> Self {
        Self::with_backend(MemoryBackend)
    }
}

impl<B: CompletionBackend> CompletionStore<B> {
    /// Store over a custom persistence backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            completions: BTreeMap::new(),
            backend,
        }
    }

    /// Borrow the persistence backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutably borrow the persistence backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Hydrate the in-memory view from already-fetched records.
    ///
    /// Duplicate `(habit_id, date)` pairs keep the latest `completed_at`.
    pub fn load<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Completion>,
    {
        for record in records {
            self.completions
                .entry(record.habit_id)
                .or_default()
                .insert(record.date, record.completed_at);
        }
    }

    /// Toggle the completion for `(habit_id, date)` and return the new state
    /// (`true` = now completed).
    ///
    /// The local state flips first; if the backend write fails the flip is
    /// reverted and the error returned, leaving the store exactly as before.
    /// Two successful toggles in sequence restore the original state. Dates
    /// outside the habit's active window are accepted here and filtered out
    /// by the metrics layer instead.
    ///
    /// # Errors
    /// Propagates the backend failure after reverting the optimistic flip.
    pub fn toggle(&mut self, habit_id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let existing = self
            .completions
            .get(habit_id)
            .and_then(|days| days.get(&date).copied());

        match existing {
            Some(completed_at) => {
                // Optimistically remove, then persist the removal.
                if let Some(days) = self.completions.get_mut(habit_id) {
                    days.remove(&date);
                }
                if let Err(err) = self.backend.remove(habit_id, date) {
                    self.completions
                        .entry(habit_id.to_string())
                        .or_default()
                        .insert(date, completed_at);
                    return Err(err);
                }
                Ok(false)
            }
            None => {
                let completed_at = Utc::now();
                self.completions
                    .entry(habit_id.to_string())
                    .or_default()
                    .insert(date, completed_at);
                if let Err(err) = self.backend.upsert(habit_id, date, completed_at) {
                    if let Some(days) = self.completions.get_mut(habit_id) {
                        days.remove(&date);
                    }
                    return Err(err);
                }
                Ok(true)
            }
        }
    }

    /// Whether a completion exists for `(habit_id, date)`.
    pub fn is_completed(&self, habit_id: &str, date: NaiveDate) -> bool {
        self.completions
            .get(habit_id)
            .map(|days| days.contains_key(&date))
            .unwrap_or(false)
    }

    /// Ascending completion dates for `habit_id` within `[from, to]`.
    ///
    /// Pure query; no cursor state is retained between calls.
    pub fn list_in_range(&self, habit_id: &str, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        match self.completions.get(habit_id) {
            Some(days) => days.range(from..=to).map(|(date, _)| *date).collect(),
            None => Vec::new(),
        }
    }

    /// Number of completions for `habit_id` within `[from, to]`.
    pub fn count_in_range(&self, habit_id: &str, from: NaiveDate, to: NaiveDate) -> usize {
        match self.completions.get(habit_id) {
            Some(days) => days.range(from..=to).count(),
            None => 0,
        }
    }

    /// Drop every completion for `habit_id`, locally and in the backend.
    ///
    /// Supports the destructive habit delete cascade.
    ///
    /// # Errors
    /// Reverts the local removal and propagates the backend failure.
    pub fn remove_all_for(&mut self, habit_id: &str) -> Result<usize, StoreError> {
        let removed = self.completions.remove(habit_id);
        let local_count = removed.as_ref().map(BTreeMap::len).unwrap_or(0);
        if let Err(err) = self.backend.remove_all_for(habit_id) {
            if let Some(days) = removed {
                self.completions.insert(habit_id.to_string(), days);
            }
            return Err(err);
        }
        Ok(local_count)
    }
}
