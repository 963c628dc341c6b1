//! Generic list reordering with optimistic persistence.
//!
//! The suite repeats one pattern across todo items, wishlist items, shopping
//! items, and prayer sections: move an element, reindex every display_order,
//! persist the new order, and roll back if the write fails. This module is
//! that pattern expressed once, reused by every list type.

use crate::error::{CoreError, StoreError, ValidationError};

/// Item carrying a persisted display position.
pub trait Orderable {
    /// Record the item's new zero-based position.
    fn set_display_order(&mut self, index: usize);
}

/// Move the element at `from` to `to`, shifting the rest.
///
/// # Errors
/// Returns an out-of-bounds error for either index; the list is unchanged.
pub fn reorder<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), ValidationError> {
    let len = items.len();
    if from >= len {
        return Err(ValidationError::OutOfBounds {
            collection: "items".to_string(),
            index: from,
            len,
        });
    }
    if to >= len {
        return Err(ValidationError::OutOfBounds {
            collection: "items".to_string(),
            index: to,
            len,
        });
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Optimistically reorder, reindex display positions, and persist.
///
/// The move and reindex happen first; `persist` receives the new order. On a
/// failed write the list reverts to its pre-move state (positions included)
/// and the error is surfaced. One attempt, no retry.
///
/// # Errors
/// Out-of-bounds indices, or the persistence failure after rollback.
pub fn apply_reorder<T, F>(
    items: &mut Vec<T>,
    from: usize,
    to: usize,
    persist: F,
) -> Result<(), CoreError>
where
    T: Orderable + Clone,
    F: FnOnce(&[T]) -> Result<(), StoreError>,
{
    let snapshot = items.clone();
    reorder(items, from, to)?;
    for (index, item) in items.iter_mut().enumerate() {
        item.set_display_order(index);
    }
    if let Err(err) = persist(items) {
        *items = snapshot;
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        name: &'static str,
        display_order: usize,
    }

    impl Orderable for Item {
        fn set_display_order(&mut self, index: usize) {
            self.display_order = index;
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item { name: "a", display_order: 0 },
            Item { name: "b", display_order: 1 },
            Item { name: "c", display_order: 2 },
        ]
    }

    #[test]
    fn reorder_moves_and_shifts() {
        let mut list = items();
        reorder(&mut list, 0, 2).unwrap();
        let names: Vec<_> = list.iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn out_of_bounds_indices_are_rejected() {
        let mut list = items();
        assert!(matches!(
            reorder(&mut list, 3, 0),
            Err(ValidationError::OutOfBounds { index: 3, .. })
        ));
        assert!(matches!(
            reorder(&mut list, 0, 3),
            Err(ValidationError::OutOfBounds { index: 3, .. })
        ));
        // Untouched after failures
        assert_eq!(list, items());
    }

    #[test]
    fn apply_reorder_reindexes_on_success() {
        let mut list = items();
        apply_reorder(&mut list, 2, 0, |_| Ok(())).unwrap();
        let order: Vec<_> = list.iter().map(|i| (i.name, i.display_order)).collect();
        assert_eq!(order, vec![("c", 0), ("a", 1), ("b", 2)]);
    }

    #[test]
    fn apply_reorder_rolls_back_on_failed_persist() {
        let mut list = items();
        let err = apply_reorder(&mut list, 2, 0, |_| {
            Err(StoreError::WriteRejected("network lost".into()))
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::WriteRejected(_))));
        assert_eq!(list, items());
    }
}
