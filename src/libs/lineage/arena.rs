//! Append-only clone storage.
//!
//! Every other structure holds [`CloneId`]s into a store. Clones are pushed,
//! never removed, so an id stays valid for the life of the store.

use super::clone::{AnnotatedClone, CloneId};
use super::error::LineageError;

pub trait CloneStore {
    fn get(&self, id: CloneId) -> Option<&AnnotatedClone>;

    fn len(&self) -> usize;

    /// Append a clone and return its id, which is always the previous `len()`.
    fn push(&mut self, clone: AnnotatedClone) -> CloneId;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fetch(&self, id: CloneId) -> Result<&AnnotatedClone, LineageError> {
        self.get(id).ok_or(LineageError::UnknownClone(id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CloneArena {
    clones: Vec<AnnotatedClone>,
}

impl CloneArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CloneId, &AnnotatedClone)> {
        self.clones.iter().enumerate()
    }

    pub fn ids(&self) -> std::ops::Range<CloneId> {
        0..self.clones.len()
    }

    /// Move clones created elsewhere to the end of the arena.
    /// Returns the id of the first appended clone.
    pub fn append(&mut self, clones: Vec<AnnotatedClone>) -> CloneId {
        let first = self.clones.len();
        self.clones.extend(clones);
        first
    }
}

impl From<Vec<AnnotatedClone>> for CloneArena {
    fn from(clones: Vec<AnnotatedClone>) -> Self {
        Self { clones }
    }
}

impl CloneStore for CloneArena {
    fn get(&self, id: CloneId) -> Option<&AnnotatedClone> {
        self.clones.get(id)
    }

    fn len(&self) -> usize {
        self.clones.len()
    }

    fn push(&mut self, clone: AnnotatedClone) -> CloneId {
        self.clones.push(clone);
        self.clones.len() - 1
    }
}

impl std::ops::Index<CloneId> for CloneArena {
    type Output = AnnotatedClone;

    fn index(&self, id: CloneId) -> &Self::Output {
        &self.clones[id]
    }
}

/// A private append region layered over a shared, read-only arena.
///
/// Ids below `base.len()` resolve to the shared arena, the rest to clones
/// pushed through this overlay. One overlay per worker lets components be
/// reconciled concurrently; the local clones are moved into the arena
/// afterwards and the ids shifted accordingly.
#[derive(Debug)]
pub struct OverlayArena<'a> {
    base: &'a CloneArena,
    local: Vec<AnnotatedClone>,
}

impl<'a> OverlayArena<'a> {
    pub fn new(base: &'a CloneArena) -> Self {
        Self {
            base,
            local: Vec::new(),
        }
    }

    pub fn into_local(self) -> Vec<AnnotatedClone> {
        self.local
    }
}

impl CloneStore for OverlayArena<'_> {
    fn get(&self, id: CloneId) -> Option<&AnnotatedClone> {
        if id < self.base.len() {
            self.base.get(id)
        } else {
            self.local.get(id - self.base.len())
        }
    }

    fn len(&self) -> usize {
        self.base.len() + self.local.len()
    }

    fn push(&mut self, clone: AnnotatedClone) -> CloneId {
        self.local.push(clone);
        self.len() - 1
    }
}
