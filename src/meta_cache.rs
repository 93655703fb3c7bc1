//! Per-slot metadata snapshot cache
//!
//! Keeps each slot's parsed header in sync with its backing file. Refreshed
//! after every write (create, import, save, autosave) and every load; a
//! failed refresh leaves the previous snapshot in place so callers see
//! stale-but-present data rather than a hole.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::backend::SaveBackend;
use crate::types::{SaveError, SaveMeta};

/// Shared cache of slot metadata, safe to refresh from background workers
pub struct MetaCache {
    entries: RwLock<HashMap<u32, SaveMeta>>,
}

impl MetaCache {
    pub fn new() -> Self {
        MetaCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Re-parses the slot's file and replaces the cached snapshot.
    ///
    /// On failure the cache keeps whatever snapshot it had; the error is
    /// returned for the caller to decide whether that is acceptable.
    pub fn refresh(&self, backend: &dyn SaveBackend, index: u32) -> Result<(), SaveError> {
        let meta = backend.read_metadata(index)?;
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(index, meta);
        Ok(())
    }

    /// Cloned snapshot for a slot, if one has been cached.
    pub fn get(&self, index: u32) -> Option<SaveMeta> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&index)
            .cloned()
    }

    /// Drops the snapshot for a deleted slot.
    pub fn forget(&self, index: u32) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&index);
    }

    /// Drops every snapshot (registry rebuild).
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl Default for MetaCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, GameMode};
    use chrono::Utc;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlakyBackend {
        fail: AtomicBool,
        wave: AtomicBool, // false => wave 1, true => wave 2
    }

    impl FlakyBackend {
        fn meta(wave: u32) -> SaveMeta {
            let now = Utc::now();
            SaveMeta {
                created: now,
                modified: now,
                map: "meadow".to_string(),
                build: 1,
                wave,
                difficulty: Difficulty::Normal,
                mode: GameMode::Waves,
            }
        }
    }

    impl SaveBackend for FlakyBackend {
        fn is_valid(&self, _index: u32) -> bool {
            !self.fail.load(Ordering::SeqCst)
        }

        fn read_metadata(&self, _index: u32) -> Result<SaveMeta, SaveError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SaveError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "gone",
                )));
            }
            let wave = if self.wave.load(Ordering::SeqCst) { 2 } else { 1 };
            Ok(Self::meta(wave))
        }

        fn write_new(&self, _index: u32) -> Result<(), SaveError> {
            Ok(())
        }

        fn save_to(&self, _index: u32) -> Result<(), SaveError> {
            Ok(())
        }

        fn load_from(&self, _index: u32) -> Result<(), SaveError> {
            Ok(())
        }

        fn path_for(&self, index: u32) -> PathBuf {
            PathBuf::from(format!("/nonexistent/slot_{}.json", index))
        }

        fn extension(&self) -> &str {
            "json"
        }
    }

    #[test]
    fn test_refresh_replaces_snapshot() {
        let backend = FlakyBackend {
            fail: AtomicBool::new(false),
            wave: AtomicBool::new(false),
        };
        let cache = MetaCache::new();

        assert!(cache.get(0).is_none());
        cache.refresh(&backend, 0).unwrap();
        assert_eq!(cache.get(0).unwrap().wave, 1);

        backend.wave.store(true, Ordering::SeqCst);
        cache.refresh(&backend, 0).unwrap();
        assert_eq!(cache.get(0).unwrap().wave, 2);
    }

    #[test]
    fn test_failed_refresh_keeps_stale_snapshot() {
        let backend = FlakyBackend {
            fail: AtomicBool::new(false),
            wave: AtomicBool::new(false),
        };
        let cache = MetaCache::new();

        cache.refresh(&backend, 0).unwrap();
        backend.fail.store(true, Ordering::SeqCst);

        assert!(cache.refresh(&backend, 0).is_err());
        assert_eq!(cache.get(0).unwrap().wave, 1);
    }

    #[test]
    fn test_forget_and_clear() {
        let backend = FlakyBackend {
            fail: AtomicBool::new(false),
            wave: AtomicBool::new(false),
        };
        let cache = MetaCache::new();

        cache.refresh(&backend, 0).unwrap();
        cache.refresh(&backend, 1).unwrap();

        cache.forget(0);
        assert!(cache.get(0).is_none());
        assert!(cache.get(1).is_some());

        cache.clear();
        assert!(cache.get(1).is_none());
    }
}
