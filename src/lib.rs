//! Save-slot management for a persistent game
//!
//! This crate provides a save-slot manager with:
//! - A bounded registry of numbered slots, each backed by one file
//! - A single "current" slot driving autosave eligibility
//! - A phase-gated autosave timer that persists off the tick path
//! - Import/export of slot files and per-slot name/autosave settings
//!
//! # Architecture
//!
//! - `types`: save metadata, file document and error types
//! - `session`: trait connecting the slot system to the live game state
//! - `backend`: save file store contract + default JSON implementation
//! - `settings`: key/value settings with slot-scoped typed accessors
//! - `lifecycle`: application phases and the transition notifier
//! - `meta_cache`: per-slot metadata snapshots
//! - `store`: slot registry and index allocation
//! - `scheduler`: autosave timing state machine
//! - `manager`: the SavesManager façade
//!
//! # Example Usage
//!
//! ```ignore
//! // Wire up the save system
//! let session = Arc::new(Mutex::new(world));
//! let backend = JsonSaveBackend::new(default_save_dir("mygame"), session)?;
//! let settings = Settings::load(config_dir.join("settings.json"))?;
//! let notifier = Arc::new(PhaseNotifier::new());
//! let mut saves = SavesManager::new(backend, settings, Arc::clone(&notifier), 16);
//!
//! // Discover existing slots, then drive it from the game loop
//! saves.reload();
//! loop {
//!     notifier.transition(GamePhase::Playing);
//!     saves.tick(delta_seconds);
//! }
//! ```

pub mod backend;
pub mod lifecycle;
pub mod manager;
pub mod meta_cache;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use backend::{default_save_dir, JsonSaveBackend, SaveBackend};
pub use lifecycle::{GamePhase, PhaseNotifier, Subscription};
pub use manager::SavesManager;
pub use meta_cache::MetaCache;
pub use scheduler::SchedulerPhase;
pub use session::Session;
pub use settings::Settings;
pub use store::SaveSlot;
pub use types::*;
