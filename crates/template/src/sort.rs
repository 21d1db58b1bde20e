//! Ranking keys collected by `<sort>` while one repetition item is mapped.

use crate::error::TemplateError;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub order: SortOrder,
    pub key: String,
}

/// The keys of one repetition item, in the order they were emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortKeys {
    keys: Vec<SortKey>,
}

impl SortKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a key. Empty keys carry no ranking and are dropped.
    pub fn push(&mut self, order: SortOrder, key: impl Into<String>) {
        let key = key.into();
        if !key.is_empty() {
            self.keys.push(SortKey { order, key });
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compares key by key. A position where only one side has a key is
    /// skipped; keys are compared bytewise in their shared direction.
    ///
    /// Both sides must agree on the direction wherever both have a key.
    pub fn compare(&self, other: &SortKeys) -> Result<Ordering, TemplateError> {
        for (position, (a, b)) in self.keys.iter().zip(&other.keys).enumerate() {
            if a.order != b.order {
                return Err(TemplateError::SortDirectionConflict { position });
            }
            let ordering = a.key.as_bytes().cmp(b.key.as_bytes());
            if ordering != Ordering::Equal {
                return Ok(match a.order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                });
            }
        }
        Ok(Ordering::Equal)
    }
}

/// Stable sort of repetition items by their key sets.
///
/// # Errors
///
/// Fails with [`TemplateError::SortDirectionConflict`] when any two items
/// give the key at the same position different directions, even items the
/// sort would never compare with each other. The check runs before anything
/// moves, so on error `items` is left in its original order.
pub fn sort_by_keys<T>(items: &mut [(T, SortKeys)]) -> Result<(), TemplateError> {
    check_directions(items.iter().map(|(_, keys)| keys))?;
    // Missing keys make the order partial, which `slice::sort_by` may reject,
    // so this is a plain insertion sort.
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && items[j - 1].1.compare(&items[j].1)? == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
    Ok(())
}

fn check_directions<'a>(sets: impl Iterator<Item = &'a SortKeys>) -> Result<(), TemplateError> {
    let mut seen: Vec<SortOrder> = Vec::new();
    for set in sets {
        for (position, key) in set.keys.iter().enumerate() {
            match seen.get(position) {
                Some(&order) if order != key.order => {
                    return Err(TemplateError::SortDirectionConflict { position });
                }
                Some(_) => {}
                None => seen.push(key.order),
            }
        }
    }
    Ok(())
}
