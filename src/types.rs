//! Core data types for the save-slot system
//!
//! This module defines the data structures shared across the crate:
//! - Save file header metadata (`SaveMeta`) and the enums it records
//! - The root save file document used by the default JSON backend
//! - Error types for slot operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current save file version
pub const SAVE_VERSION: u32 = 1;

/// Difficulty recorded in a save file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Insane,
}

/// Game mode recorded in a save file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Waves,
    Sandbox,
    FreeBuild,
}

/// Metadata snapshot parsed from a save file header
///
/// A `SaveMeta` is immutable once read; re-reading the file produces a new
/// snapshot. It is always derived by parsing the slot's backing file, never
/// assembled by hand, so a cached snapshot can only ever lag the file, not
/// contradict it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMeta {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub map: String,
    pub build: u32,
    pub wave: u32,
    pub difficulty: Difficulty,
    pub mode: GameMode,
}

/// Header fields the live session reports when a save is written
///
/// The backend stamps these into the file header alongside the timestamps
/// it manages itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub map: String,
    pub build: u32,
    pub wave: u32,
    pub difficulty: Difficulty,
    pub mode: GameMode,
}

/// The root save file structure written by the default JSON backend
///
/// The `state` payload is opaque to the slot system; it is produced and
/// consumed by the application's [`Session`](crate::session::Session)
/// implementation.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub meta: SaveMeta,
    pub state: serde_json::Value,
}

/// Error types for save-slot operations
#[derive(Debug)]
pub enum SaveError {
    /// Disk or file failure (copy, write, delete)
    IoError(std::io::Error),

    /// Corrupt or unreadable save metadata
    ParseError(serde_json::Error),

    /// Save file written by a newer build than this one understands
    InvalidVersion(u32),

    /// Attempted to add a slot beyond the registry capacity
    CapacityReached(usize),

    /// Operated on a slot index that is not in the registry
    SlotNotFound(u32),
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::IoError(e) => write!(f, "IO error: {}", e),
            SaveError::ParseError(e) => write!(f, "Parse error: {}", e),
            SaveError::InvalidVersion(v) => write!(f, "Invalid save version: {}", v),
            SaveError::CapacityReached(cap) => {
                write!(f, "Save slot capacity reached ({} slots)", cap)
            }
            SaveError::SlotNotFound(index) => write!(f, "No save slot at index {}", index),
        }
    }
}

impl std::error::Error for SaveError {}

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        SaveError::IoError(err)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(err: serde_json::Error) -> Self {
        SaveError::ParseError(err)
    }
}
