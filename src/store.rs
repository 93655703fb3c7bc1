//! Slot registry and index allocation
//!
//! `SlotStore` is the source of truth for which slot indices exist. Indices
//! are claimed monotonically from 0 and never reused within a registry
//! lifetime, even after deletions; the registry itself is bounded by a
//! fixed capacity counted over live entries.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::backend::SaveBackend;
use crate::meta_cache::MetaCache;
use crate::types::SaveError;

/// Handle to a numbered save slot
///
/// The index is assigned at construction and never changes; everything else
/// about a slot (name, autosave flag, metadata) is looked up through the
/// manager by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveSlot {
    index: u32,
}

impl SaveSlot {
    pub(crate) fn new(index: u32) -> Self {
        SaveSlot { index }
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

pub(crate) struct SlotStore {
    slots: Vec<SaveSlot>,
    next_index: u32,
    capacity: usize,
}

impl SlotStore {
    pub fn new(capacity: usize) -> Self {
        SlotStore {
            slots: Vec::new(),
            next_index: 0,
            capacity,
        }
    }

    pub fn slots(&self) -> &[SaveSlot] {
        &self.slots
    }

    pub fn contains(&self, index: u32) -> bool {
        self.slots.iter().any(|s| s.index == index)
    }

    pub fn can_add(&self) -> bool {
        self.slots.len() < self.capacity
    }

    #[cfg(test)]
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Rebuilds the registry by scanning every index the store can hold.
    ///
    /// A slot that exists but cannot be parsed is treated as absent; one bad
    /// file never aborts the scan. The next free index lands one past the
    /// highest valid index seen.
    pub fn reload(&mut self, backend: &dyn SaveBackend, cache: &MetaCache) {
        self.slots.clear();
        self.next_index = 0;
        cache.clear();

        for index in 0..self.capacity as u32 {
            if !backend.is_valid(index) {
                continue;
            }
            if let Err(e) = cache.refresh(backend, index) {
                log::warn!("skipping save slot {}: unreadable metadata: {}", index, e);
                continue;
            }
            self.slots.push(SaveSlot::new(index));
            self.next_index = index + 1;
        }

        log::info!("registry reloaded: {} slot(s)", self.slots.len());
    }

    /// Claims the next free index and writes a fresh save file there.
    ///
    /// The write is synchronous and its failure is fatal to the call: the
    /// index stays unclaimed and nothing is registered.
    pub fn allocate(&mut self, backend: &dyn SaveBackend) -> Result<SaveSlot, SaveError> {
        if !self.can_add() {
            return Err(SaveError::CapacityReached(self.capacity));
        }

        let index = self.next_index;
        backend.write_new(index)?;

        self.next_index += 1;
        let slot = SaveSlot::new(index);
        self.slots.push(slot);
        Ok(slot)
    }

    /// Claims the next free index by copying an external save file into it.
    ///
    /// The copy completes and the result parses before anything is
    /// registered; on any failure the half-copied file is deleted and the
    /// registry and index counter are left untouched.
    pub fn import_from(
        &mut self,
        backend: &dyn SaveBackend,
        source: &Path,
    ) -> Result<SaveSlot, SaveError> {
        if !self.can_add() {
            return Err(SaveError::CapacityReached(self.capacity));
        }

        let index = self.next_index;
        let destination = backend.path_for(index);

        if let Err(e) = fs::copy(source, &destination) {
            discard_partial(&destination);
            return Err(SaveError::IoError(e));
        }

        if let Err(e) = backend.read_metadata(index) {
            discard_partial(&destination);
            return Err(e);
        }

        self.next_index += 1;
        let slot = SaveSlot::new(index);
        self.slots.push(slot);
        Ok(slot)
    }

    /// Removes a slot from the registry and deletes its backing file.
    ///
    /// The registry entry is removed unconditionally; a missing backing
    /// file is fine, any other filesystem error is reported after the
    /// removal has completed.
    pub fn remove(&mut self, backend: &dyn SaveBackend, index: u32) -> Result<(), SaveError> {
        let position = self
            .slots
            .iter()
            .position(|s| s.index == index)
            .ok_or(SaveError::SlotNotFound(index))?;
        self.slots.remove(position);

        match fs::remove_file(backend.path_for(index)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SaveError::IoError(e)),
        }
    }
}

fn discard_partial(destination: &Path) {
    if let Err(e) = fs::remove_file(destination) {
        if e.kind() != ErrorKind::NotFound {
            log::warn!(
                "could not remove partial import at {}: {}",
                destination.display(),
                e
            );
        }
    }
}
