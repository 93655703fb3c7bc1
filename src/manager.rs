//! Saves manager for slot lifecycle and autosave
//!
//! This module provides the SavesManager struct which handles:
//! - The registry of known save slots and the single "current" slot
//! - Creating, importing, exporting, deleting and switching slots
//! - Reacting to application phase changes (back to menu drops "current")
//! - Driving the autosave scheduler and running persists off the tick path
//!
//! # Concurrency
//!
//! The per-frame `tick` never blocks on disk I/O; threshold crossings hand
//! the persist to a detached worker thread. "Current" lives behind one
//! mutex and every writer (explicit operations, the lifecycle handler, the
//! reset) goes through it, so a menu transition racing an in-flight
//! autosave can never resurrect a cleared slot.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use crate::backend::SaveBackend;
use crate::lifecycle::{GamePhase, PhaseNotifier, Subscription};
use crate::meta_cache::MetaCache;
use crate::scheduler::{AutosaveScheduler, SchedulerPhase};
use crate::settings::Settings;
use crate::store::{SaveSlot, SlotStore};
use crate::types::{SaveError, SaveMeta};

/// State shared between the tick thread, background persist workers and the
/// lifecycle handler.
struct SharedState {
    current: Mutex<Option<u32>>,
    saving: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Façade over the slot registry, metadata cache and autosave scheduler
pub struct SavesManager<B: SaveBackend> {
    backend: Arc<B>,
    settings: Settings,
    store: SlotStore,
    cache: Arc<MetaCache>,
    scheduler: AutosaveScheduler,
    shared: Arc<SharedState>,
    notifier: Arc<PhaseNotifier>,
    subscription: Subscription,
}

impl<B: SaveBackend + 'static> SavesManager<B> {
    /// Creates a manager over `backend` holding at most `capacity` slots.
    ///
    /// Subscribes to the phase notifier so that returning to the menu
    /// clears the current slot; the subscription is dropped with the
    /// manager.
    pub fn new(
        backend: B,
        settings: Settings,
        notifier: Arc<PhaseNotifier>,
        capacity: usize,
    ) -> Self {
        let shared = Arc::new(SharedState {
            current: Mutex::new(None),
            saving: AtomicBool::new(false),
        });

        let handler_shared = Arc::clone(&shared);
        let subscription = notifier.subscribe(move |_prev, next| {
            if next == GamePhase::Menu {
                *lock(&handler_shared.current) = None;
            }
        });

        SavesManager {
            backend: Arc::new(backend),
            settings,
            store: SlotStore::new(capacity),
            cache: Arc::new(MetaCache::new()),
            scheduler: AutosaveScheduler::new(),
            shared,
            notifier,
            subscription,
        }
    }

    /// Rebuilds the registry from whatever valid slot files exist on disk.
    ///
    /// Corrupt slots are skipped, not fatal. Idempotent when nothing
    /// changed underneath.
    pub fn reload(&mut self) {
        self.store.reload(self.backend.as_ref(), &self.cache);
    }

    /// The slot most recently loaded, saved or created, if any.
    pub fn get_current(&self) -> Option<SaveSlot> {
        let index = (*lock(&self.shared.current))?;
        self.store.slots().iter().copied().find(|s| s.index() == index)
    }

    /// Forgets the current slot without touching any files.
    pub fn reset_current(&self) {
        *lock(&self.shared.current) = None;
    }

    /// Whether a background persist is in flight right now.
    pub fn is_saving(&self) -> bool {
        self.shared.saving.load(Ordering::SeqCst)
    }

    /// Observable autosave scheduler state.
    pub fn scheduler_phase(&self) -> SchedulerPhase {
        self.scheduler.phase()
    }

    pub fn can_add_save(&self) -> bool {
        self.store.can_add()
    }

    /// Live view of the registry in discovery/creation order.
    pub fn slots(&self) -> &[SaveSlot] {
        self.store.slots()
    }

    /// Cached metadata snapshot for a slot, if one has been read.
    pub fn slot_meta(&self, index: u32) -> Option<SaveMeta> {
        self.cache.get(index)
    }

    /// Creates a new save in the next free slot and makes it current.
    pub fn add_save(&mut self, name: &str) -> Result<SaveSlot, SaveError> {
        let slot = self.store.allocate(self.backend.as_ref())?;
        self.settings.set_slot_name(slot.index(), name);
        self.settings.save()?;
        self.cache.refresh(self.backend.as_ref(), slot.index())?;
        self.set_current(slot.index());
        log::info!("created save slot {} ({})", slot.index(), name);
        Ok(slot)
    }

    /// Imports an external save file into the next free slot and makes it
    /// current. The display name defaults to the file's base name.
    ///
    /// A copy that cannot complete leaves no half-imported slot behind: the
    /// partial file is deleted and neither the registry nor the index
    /// counter move.
    pub fn import_save(&mut self, source: &Path) -> Result<SaveSlot, SaveError> {
        let slot = self.store.import_from(self.backend.as_ref(), source)?;
        if let Some(stem) = source.file_stem() {
            self.settings.set_slot_name(slot.index(), &stem.to_string_lossy());
            self.settings.save()?;
        }
        self.cache.refresh(self.backend.as_ref(), slot.index())?;
        self.set_current(slot.index());
        log::info!("imported {} into slot {}", source.display(), slot.index());
        Ok(slot)
    }

    /// Loads a slot into the session and makes it current.
    ///
    /// On failure the current slot is left unchanged.
    pub fn load_slot(&self, index: u32) -> Result<(), SaveError> {
        self.require_slot(index)?;
        self.backend.load_from(index)?;
        self.cache.refresh(self.backend.as_ref(), index)?;
        self.set_current(index);
        Ok(())
    }

    /// Explicitly persists the session into a slot and makes it current.
    ///
    /// On failure the current slot is left unchanged.
    pub fn save_slot(&self, index: u32) -> Result<(), SaveError> {
        self.require_slot(index)?;
        self.backend.save_to(index)?;
        self.cache.refresh(self.backend.as_ref(), index)?;
        self.set_current(index);
        Ok(())
    }

    pub fn slot_name(&self, index: u32) -> Result<String, SaveError> {
        self.require_slot(index)?;
        Ok(self.settings.slot_name(index))
    }

    pub fn set_slot_name(&mut self, index: u32, name: &str) -> Result<(), SaveError> {
        self.require_slot(index)?;
        self.settings.set_slot_name(index, name);
        self.settings.save()
    }

    pub fn is_autosave_enabled(&self, index: u32) -> Result<bool, SaveError> {
        self.require_slot(index)?;
        Ok(self.settings.slot_autosave(index))
    }

    pub fn set_autosave_enabled(&mut self, index: u32, enabled: bool) -> Result<(), SaveError> {
        self.require_slot(index)?;
        self.settings.set_slot_autosave(index, enabled);
        self.settings.save()
    }

    /// Copies a slot's backing file to `destination`, coercing its
    /// extension to the canonical save extension. Returns the path written.
    pub fn export_slot(&self, index: u32, destination: &Path) -> Result<PathBuf, SaveError> {
        self.require_slot(index)?;

        let destination = if destination.extension().and_then(|e| e.to_str())
            == Some(self.backend.extension())
        {
            destination.to_path_buf()
        } else {
            destination.with_extension(self.backend.extension())
        };

        fs::copy(self.backend.path_for(index), &destination)?;
        Ok(destination)
    }

    /// Deletes a slot's backing file and registry entry. Deleting the
    /// current slot clears "current".
    pub fn delete_slot(&mut self, index: u32) -> Result<(), SaveError> {
        if !self.store.contains(index) {
            return Err(SaveError::SlotNotFound(index));
        }

        {
            let mut current = lock(&self.shared.current);
            if *current == Some(index) {
                *current = None;
            }
        }
        self.cache.forget(index);
        self.store.remove(self.backend.as_ref(), index)
    }

    /// Per-frame driver. Feeds elapsed time to the autosave scheduler and,
    /// on a threshold crossing, hands the persist of the current slot to a
    /// background worker. Never blocks on disk I/O.
    pub fn tick(&mut self, delta_seconds: f32) {
        let phase = self.notifier.phase();
        let current = *lock(&self.shared.current);
        let eligible = phase == GamePhase::Playing
            && current.map(|i| self.settings.slot_autosave(i)).unwrap_or(false);
        let interval = self.settings.save_interval();
        let saving = self.is_saving();

        if self.scheduler.tick(delta_seconds, interval, eligible, saving) {
            if let Some(index) = current {
                self.spawn_autosave(index);
            }
        }
    }

    /// Runs the persist + metadata refresh on a detached worker. The worker
    /// never assigns "current": the slot already is current, and if the
    /// player bailed to the menu mid-save the cleared state must stand.
    fn spawn_autosave(&self, index: u32) {
        self.shared.saving.store(true, Ordering::SeqCst);

        let backend = Arc::clone(&self.backend);
        let cache = Arc::clone(&self.cache);
        let shared = Arc::clone(&self.shared);

        thread::spawn(move || {
            match backend.save_to(index) {
                Ok(()) => {
                    if let Err(e) = cache.refresh(backend.as_ref(), index) {
                        log::warn!("metadata refresh after autosave of slot {} failed: {}", index, e);
                    }
                    log::info!("autosaved slot {}", index);
                }
                Err(e) => log::error!("autosave for slot {} failed: {}", index, e),
            }
            shared.saving.store(false, Ordering::SeqCst);
        });
    }

    fn require_slot(&self, index: u32) -> Result<(), SaveError> {
        if self.store.contains(index) {
            Ok(())
        } else {
            Err(SaveError::SlotNotFound(index))
        }
    }

    fn set_current(&self, index: u32) {
        *lock(&self.shared.current) = Some(index);
    }
}

impl<B: SaveBackend> Drop for SavesManager<B> {
    fn drop(&mut self) {
        self.notifier.unsubscribe(self.subscription);
    }
}
