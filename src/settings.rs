//! Key/value settings store backing per-slot properties
//!
//! Persists loosely-typed settings to a single JSON file with an explicit
//! `save()` flush. Slot-scoped values (display name, autosave flag) get
//! typed accessors so the `save-<index>-...` key strings are built in
//! exactly one place.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::SaveError;

/// Default display name for a slot that was never named
const DEFAULT_SLOT_NAME: &str = "untitled";

/// Autosave interval in seconds when `saveinterval` is unset
const DEFAULT_SAVE_INTERVAL_SECS: i64 = 300;

const SAVE_INTERVAL_KEY: &str = "saveinterval";

/// JSON-file-backed settings store
///
/// Mutations stay in memory until [`Settings::save`] flushes them; a missing
/// file on load simply yields defaults.
pub struct Settings {
    path: PathBuf,
    values: HashMap<String, serde_json::Value>,
}

impl Settings {
    /// Loads settings from `path`
    ///
    /// A missing file yields an empty store. An unreadable or corrupt file
    /// is logged and replaced with defaults rather than aborting startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SaveError> {
        let path = path.as_ref().to_path_buf();

        let values = match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(values) => values,
                Err(e) => {
                    log::warn!("settings file {} is corrupt, using defaults: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(SaveError::IoError(e)),
        };

        Ok(Settings { path, values })
    }

    /// Flushes all values to disk
    pub fn save(&self) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    }

    pub fn put_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    pub fn put_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values
            .get(key)
            .and_then(|v| v.as_i64())
            .unwrap_or(default)
    }

    pub fn put_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value.into());
    }

    // Slot-scoped keys. All key construction lives in these two helpers.

    fn name_key(index: u32) -> String {
        format!("save-{}-name", index)
    }

    fn autosave_key(index: u32) -> String {
        format!("save-{}-autosave", index)
    }

    /// Display name for a slot, defaulting to `"untitled"`.
    pub fn slot_name(&self, index: u32) -> String {
        self.get_string(&Self::name_key(index), DEFAULT_SLOT_NAME)
    }

    pub fn set_slot_name(&mut self, index: u32, name: &str) {
        self.put_string(&Self::name_key(index), name);
    }

    /// Whether autosave is enabled for a slot. Defaults to true.
    pub fn slot_autosave(&self, index: u32) -> bool {
        self.get_bool(&Self::autosave_key(index), true)
    }

    pub fn set_slot_autosave(&mut self, index: u32, enabled: bool) {
        self.put_bool(&Self::autosave_key(index), enabled);
    }

    /// Autosave interval in seconds (key `saveinterval`). Defaults to 300.
    pub fn save_interval(&self) -> f32 {
        self.get_int(SAVE_INTERVAL_KEY, DEFAULT_SAVE_INTERVAL_SECS) as f32
    }

    pub fn set_save_interval(&mut self, seconds: i64) {
        self.put_int(SAVE_INTERVAL_KEY, seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_for_missing_file() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path().join("settings.json")).unwrap();

        assert_eq!(settings.slot_name(0), "untitled");
        assert!(settings.slot_autosave(0));
        assert_eq!(settings.save_interval(), 300.0);
    }

    #[test]
    fn test_slot_keys_are_scoped_by_index() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::load(dir.path().join("settings.json")).unwrap();

        settings.set_slot_name(0, "first run");
        settings.set_slot_autosave(1, false);

        assert_eq!(settings.slot_name(0), "first run");
        assert_eq!(settings.slot_name(1), "untitled");
        assert!(settings.slot_autosave(0));
        assert!(!settings.slot_autosave(1));
    }

    #[test]
    fn test_flush_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::load(&path).unwrap();
        settings.set_slot_name(2, "fortress");
        settings.set_slot_autosave(2, false);
        settings.set_save_interval(60);
        settings.save().unwrap();

        let reloaded = Settings::load(&path).unwrap();
        assert_eq!(reloaded.slot_name(2), "fortress");
        assert!(!reloaded.slot_autosave(2));
        assert_eq!(reloaded.save_interval(), 60.0);
    }

    #[test]
    fn test_unflushed_values_are_not_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = Settings::load(&path).unwrap();
        settings.set_slot_name(0, "kept");
        settings.save().unwrap();
        settings.set_slot_name(0, "dropped");

        let reloaded = Settings::load(&path).unwrap();
        assert_eq!(reloaded.slot_name(0), "kept");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json at all").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.slot_name(0), "untitled");
    }

    #[test]
    fn test_typed_accessors() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::load(dir.path().join("settings.json")).unwrap();

        settings.put_int("saveinterval", 120);
        settings.put_bool("fullscreen", true);
        settings.put_string("locale", "en");

        assert_eq!(settings.save_interval(), 120.0);
        assert!(settings.get_bool("fullscreen", false));
        assert_eq!(settings.get_string("locale", ""), "en");
        // Wrong-type reads fall back to the default.
        assert_eq!(settings.get_string("fullscreen", "?"), "?");
    }
}
