//! Archival and deletion semantics.
//!
//! Archiving stops future expectation generation while keeping all history
//! queryable; every metric keeps counting days up to the archive day.
//! Deletion is the one destructive operation: it removes the habit and
//! cascades removal of its completions. Callers are expected to confirm
//! before deleting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::completion::{CompletionBackend, CompletionStore};
use crate::error::StoreError;
use crate::habit::Habit;

/// Outcome of a destructive habit delete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteSummary {
    pub deleted_completions: usize,
}

/// Governs how archiving and deletion affect expectation generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchivePolicy;

impl ArchivePolicy {
    /// Archive the habit as of `now`.
    ///
    /// Idempotent: archiving an already-archived habit keeps the original
    /// timestamp and returns `false`.
    pub fn archive(habit: &mut Habit, now: DateTime<Utc>) -> bool {
        if habit.is_archived() {
            return false;
        }
        habit.archived_at = Some(now);
        habit.updated_at = now;
        true
    }

    /// Clear the archive mark, restoring expectation generation from the
    /// unarchive point forward. History is untouched; nothing retroactive
    /// happens. Returns `false` when the habit was not archived.
    pub fn unarchive(habit: &mut Habit) -> bool {
        if habit.archived_at.take().is_none() {
            return false;
        }
        habit.updated_at = Utc::now();
        true
    }

    /// Destructively delete `habit_id` from `habits`, cascading removal of
    /// its completions. Irreversible.
    ///
    /// # Errors
    /// `StoreError::HabitNotFound` when the id is unknown; a failed cascade
    /// leaves the habit list untouched so other habits are unaffected.
    pub fn delete<B: CompletionBackend>(
        habit_id: &str,
        habits: &mut Vec<Habit>,
        completions: &mut CompletionStore<B>,
    ) -> Result<DeleteSummary, StoreError> {
        let index = habits
            .iter()
            .position(|h| h.id == habit_id)
            .ok_or_else(|| StoreError::HabitNotFound(habit_id.to_string()))?;

        // Cascade first: if the completion removal fails, the habit stays.
        let deleted_completions = completions.remove_all_for(habit_id)?;
        habits.remove(index);
        Ok(DeleteSummary {
            deleted_completions,
        })
    }
}
