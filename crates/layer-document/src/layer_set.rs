//! Ordered presentation entries forming one display configuration.
//!
//! Row 0 is the top of the layer list. Lookups by identifier go through a
//! row cache that is tagged with the set's generation; every mutation bumps
//! the generation and the cache is rebuilt on the next lookup.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use sift_common::{DocumentError, DocumentResult, LayerId};
use tracing::debug;

use crate::presentation::{LayerRef, Presentation};

#[derive(Debug, Clone, Default)]
struct RowCache {
    /// Generation the rows were computed for; `None` before the first build
    generation: Option<u64>,
    rows: HashMap<LayerId, usize>,
}

/// One ordered, independently configurable arrangement of presentation entries.
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    entries: Vec<Presentation>,
    generation: u64,
    row_cache: RefCell<RowCache>,
}

impl PartialEq for LayerSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from entries, rejecting duplicate identifiers.
    pub fn from_entries(entries: Vec<Presentation>) -> DocumentResult<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for p in &entries {
            if !seen.insert(p.id) {
                return Err(DocumentError::AlreadyExists(p.id));
            }
        }
        Ok(Self {
            entries,
            ..Self::default()
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Presentation> {
        self.entries.get(row)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Presentation> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Presentation] {
        &self.entries
    }

    /// Identifiers top to bottom.
    pub fn ids(&self) -> Vec<LayerId> {
        self.entries.iter().map(|p| p.id).collect()
    }

    /// Current generation; changes on every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Row of `id`, if present.
    pub fn lookup(&self, id: LayerId) -> Option<usize> {
        let mut cache = self.row_cache.borrow_mut();
        if cache.generation != Some(self.generation) {
            cache.rows = self
                .entries
                .iter()
                .enumerate()
                .map(|(row, p)| (p.id, row))
                .collect();
            cache.generation = Some(self.generation);
        }
        cache.rows.get(&id).copied()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.lookup(id).is_some()
    }

    /// Row of `id`, or `NotFound`.
    pub fn index_of(&self, id: LayerId) -> DocumentResult<usize> {
        self.lookup(id).ok_or(DocumentError::NotFound(id))
    }

    /// Resolve a row-or-identifier to an existing row.
    pub fn resolve(&self, target: LayerRef) -> DocumentResult<usize> {
        match target {
            LayerRef::Row(row) if row < self.entries.len() => Ok(row),
            LayerRef::Row(row) => Err(DocumentError::IndexOutOfRange {
                index: row,
                len: self.entries.len(),
            }),
            LayerRef::Id(id) => self.index_of(id),
        }
    }

    /// Insert at `index`; `index == len` appends.
    pub fn insert_entry(&mut self, index: usize, entry: Presentation) -> DocumentResult<()> {
        if index > self.entries.len() {
            return Err(DocumentError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        if self.contains(entry.id) {
            return Err(DocumentError::AlreadyExists(entry.id));
        }
        self.entries.insert(index, entry);
        self.touch();
        Ok(())
    }

    /// Replace the entry at `index`, or append when `index == len`.
    pub fn set_entry(&mut self, index: usize, entry: Presentation) -> DocumentResult<()> {
        let len = self.entries.len();
        if index > len {
            return Err(DocumentError::IndexOutOfRange { index, len });
        }
        if let Some(existing) = self.lookup(entry.id) {
            if existing != index {
                return Err(DocumentError::AlreadyExists(entry.id));
            }
        }
        if index == len {
            self.entries.push(entry);
        } else {
            self.entries[index] = entry;
        }
        self.touch();
        Ok(())
    }

    /// Edit the entry at `row` in place. The identifier must not change.
    pub fn modify<F>(&mut self, row: usize, f: F) -> DocumentResult<&Presentation>
    where
        F: FnOnce(&mut Presentation),
    {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(row)
            .ok_or(DocumentError::IndexOutOfRange { index: row, len })?;
        let id = entry.id;
        f(entry);
        debug_assert_eq!(entry.id, id, "presentation identifier changed in place");
        self.generation = self.generation.wrapping_add(1);
        Ok(&self.entries[row])
    }

    /// Remove `count` contiguous entries starting at `index`.
    ///
    /// Ordinals of the entries left animating are renumbered `0..k` in their
    /// previous playback order.
    pub fn remove_range(&mut self, index: usize, count: usize) -> DocumentResult<Vec<Presentation>> {
        let len = self.entries.len();
        let end = index
            .checked_add(count)
            .filter(|end| *end <= len)
            .ok_or(DocumentError::IndexOutOfRange {
                index: index.saturating_add(count),
                len,
            })?;
        let removed: Vec<_> = self.entries.drain(index..end).collect();
        if removed.iter().any(|p| p.animation_order.is_some()) {
            self.compact_animation_order();
        }
        self.touch();
        Ok(removed)
    }

    fn compact_animation_order(&mut self) {
        let mut animating: Vec<(usize, LayerId, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(row, p)| p.animation_order.map(|a| (a, p.id, row)))
            .collect();
        animating.sort();
        for (nth, (_, _, row)) in animating.into_iter().enumerate() {
            self.entries[row].animation_order = Some(nth);
        }
    }

    /// Rearrange entries so that new row `i` holds old row `permutation[i]`.
    pub fn reorder(&mut self, permutation: &[usize]) -> DocumentResult<()> {
        let len = self.entries.len();
        if permutation.len() != len {
            return Err(DocumentError::LengthMismatch {
                expected: len,
                actual: permutation.len(),
            });
        }
        let mut seen = vec![false; len];
        for &old in permutation {
            if old >= len {
                return Err(DocumentError::InvalidPermutation(format!(
                    "row {} out of range for {} entries",
                    old, len
                )));
            }
            if std::mem::replace(&mut seen[old], true) {
                return Err(DocumentError::InvalidPermutation(format!(
                    "row {} listed more than once",
                    old
                )));
            }
        }
        self.entries = permutation.iter().map(|&old| self.entries[old].clone()).collect();
        self.touch();
        Ok(())
    }

    /// Identifiers taking part in the animation, in playback order.
    ///
    /// Ties on the ordinal are broken by identifier.
    pub fn animation_order(&self) -> Vec<LayerId> {
        let mut ordered: Vec<(usize, LayerId)> = self
            .entries
            .iter()
            .filter_map(|p| p.animation_order.map(|a| (a, p.id)))
            .collect();
        ordered.sort();
        let order: Vec<LayerId> = ordered.into_iter().map(|(_, id)| id).collect();
        debug!(frames = order.len(), "animation order");
        order
    }

    pub fn clear_animation_order(&mut self) {
        for p in &mut self.entries {
            p.animation_order = None;
        }
        self.touch();
    }

    /// Replace the animation order with `sequence`, assigning ordinals 0..n.
    ///
    /// Every element is resolved before anything changes; an unknown layer or
    /// row leaves the set untouched.
    pub fn set_animation_order(&mut self, sequence: &[LayerRef]) -> DocumentResult<()> {
        let mut rows = Vec::with_capacity(sequence.len());
        let mut seen = HashSet::with_capacity(sequence.len());
        for target in sequence {
            let row = self.resolve(*target)?;
            if !seen.insert(row) {
                return Err(DocumentError::InvalidPermutation(format!(
                    "layer {} listed more than once in animation order",
                    self.entries[row].id
                )));
            }
            rows.push(row);
        }

        for p in &mut self.entries {
            p.animation_order = None;
        }
        for (nth, row) in rows.into_iter().enumerate() {
            self.entries[row].animation_order = Some(nth);
        }
        self.touch();
        Ok(())
    }
}

impl<'a> IntoIterator for &'a LayerSet {
    type Item = &'a Presentation;
    type IntoIter = std::slice::Iter<'a, Presentation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
