//! Session trait connecting the slot system to the live game state
//!
//! The slot manager never owns simulation state. The application implements
//! this trait once; the backend calls it to snapshot the session into a save
//! file and to restore a loaded file back into the session.

use crate::types::{SaveError, SessionInfo};

/// Interface to the running game session
///
/// # Example
///
/// ```ignore
/// impl Session for World {
///     fn descriptor(&self) -> SessionInfo {
///         SessionInfo {
///             map: self.map_name.clone(),
///             build: BUILD,
///             wave: self.wave,
///             difficulty: self.difficulty,
///             mode: self.mode,
///         }
///     }
///
///     fn snapshot(&self) -> Result<serde_json::Value, SaveError> {
///         // Serialize world + entities to an opaque payload
///     }
///
///     fn restore(&mut self, state: &serde_json::Value) -> Result<(), SaveError> {
///         // Rebuild world + entities from the payload
///     }
/// }
/// ```
pub trait Session {
    /// Header fields describing the session right now, stamped into every
    /// save file the backend writes.
    fn descriptor(&self) -> SessionInfo;

    /// Serialize the full session state to an opaque payload.
    fn snapshot(&self) -> Result<serde_json::Value, SaveError>;

    /// Replace the session state with a previously snapshotted payload.
    ///
    /// Note: this restores saved state only. Resources like textures or
    /// audio handles must be re-attached by the application afterwards.
    fn restore(&mut self, state: &serde_json::Value) -> Result<(), SaveError>;
}
