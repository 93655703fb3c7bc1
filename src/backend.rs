//! File store for slot-indexed save files
//!
//! `SaveBackend` is the contract the slot system needs from a save file
//! store: validity checks, header parsing, and whole-file save/load
//! addressed by slot index. `JsonSaveBackend` is the default
//! implementation, keeping one pretty-printed JSON document per slot under
//! a save directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::session::Session;
use crate::types::{SaveError, SaveFile, SaveMeta, SAVE_VERSION};

/// Contract between the slot system and the underlying save file store
///
/// Implementations must be shareable with background persist workers, so
/// the trait requires `Send + Sync`.
pub trait SaveBackend: Send + Sync {
    /// Whether a parseable save exists at this index.
    fn is_valid(&self, index: u32) -> bool;

    /// Parse the header of the save at this index without loading it.
    fn read_metadata(&self, index: u32) -> Result<SaveMeta, SaveError>;

    /// Write a brand-new save file at this index from the current session.
    fn write_new(&self, index: u32) -> Result<(), SaveError>;

    /// Persist the current session over the save at this index.
    fn save_to(&self, index: u32) -> Result<(), SaveError>;

    /// Load the save at this index into the current session.
    fn load_from(&self, index: u32) -> Result<(), SaveError>;

    /// Filesystem path backing this index. Two indices never share a path.
    fn path_for(&self, index: u32) -> PathBuf;

    /// Canonical file extension for exported saves.
    fn extension(&self) -> &str;
}

/// Returns the default save directory under the user's home directory,
/// falling back to `./saves` when no home directory can be determined.
pub fn default_save_dir(app_name: &str) -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(format!(".{}", app_name)).join("saves"))
        .unwrap_or_else(|| PathBuf::from("./saves"))
}

/// Default backend: one JSON document per slot
///
/// Slot files are named `slot_<index>.json`. The live session is shared as
/// `Arc<Mutex<_>>` so the application keeps using it while background
/// persists snapshot it.
pub struct JsonSaveBackend<S: Session> {
    save_directory: PathBuf,
    session: Arc<Mutex<S>>,
}

impl<S: Session + Send> JsonSaveBackend<S> {
    /// Creates a backend rooted at the given save directory
    ///
    /// The save directory will be created if it doesn't exist.
    pub fn new(save_directory: impl AsRef<Path>, session: Arc<Mutex<S>>) -> Result<Self, SaveError> {
        let save_dir = save_directory.as_ref().to_path_buf();

        if !save_dir.exists() {
            fs::create_dir_all(&save_dir)?;
        }

        Ok(JsonSaveBackend {
            save_directory: save_dir,
            session,
        })
    }

    fn read_save(&self, index: u32) -> Result<SaveFile, SaveError> {
        let filepath = self.path_for(index);
        let json = fs::read_to_string(&filepath)?;
        let save_file: SaveFile = serde_json::from_str(&json)?;

        // Files from a newer build are rejected rather than misread.
        if save_file.version > SAVE_VERSION {
            return Err(SaveError::InvalidVersion(save_file.version));
        }

        Ok(save_file)
    }

    /// Snapshot the session and write it at `index`, carrying over an
    /// existing creation date when one is supplied.
    fn write_slot(&self, index: u32, created: Option<DateTime<Utc>>) -> Result<(), SaveError> {
        let (info, state) = {
            let session = self
                .session
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            (session.descriptor(), session.snapshot()?)
        };

        let now = Utc::now();
        let save_file = SaveFile {
            version: SAVE_VERSION,
            meta: SaveMeta {
                created: created.unwrap_or(now),
                modified: now,
                map: info.map,
                build: info.build,
                wave: info.wave,
                difficulty: info.difficulty,
                mode: info.mode,
            },
            state,
        };

        let json = serde_json::to_string_pretty(&save_file)?;
        atomic_write(&self.path_for(index), json.as_bytes())?;
        Ok(())
    }
}

impl<S: Session + Send> SaveBackend for JsonSaveBackend<S> {
    fn is_valid(&self, index: u32) -> bool {
        self.path_for(index).exists() && self.read_save(index).is_ok()
    }

    fn read_metadata(&self, index: u32) -> Result<SaveMeta, SaveError> {
        Ok(self.read_save(index)?.meta)
    }

    fn write_new(&self, index: u32) -> Result<(), SaveError> {
        self.write_slot(index, None)
    }

    fn save_to(&self, index: u32) -> Result<(), SaveError> {
        // Keep the original creation date when overwriting an existing save.
        let created = self.read_save(index).ok().map(|f| f.meta.created);
        self.write_slot(index, created)
    }

    fn load_from(&self, index: u32) -> Result<(), SaveError> {
        let save_file = self.read_save(index)?;
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        session.restore(&save_file.state)
    }

    fn path_for(&self, index: u32) -> PathBuf {
        self.save_directory.join(format!("slot_{}.json", index))
    }

    fn extension(&self) -> &str {
        "json"
    }
}

/// Atomically writes `data` to `path` using the write-rename pattern
///
/// Writes to `{path}.tmp`, flushes to persistent storage, then renames onto
/// the final path. A crash mid-write leaves any existing file at `path`
/// untouched.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&tmp_path, path)?;

    Ok(())
}
