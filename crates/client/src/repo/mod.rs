//! Repository contracts consumed by the client core.
//!
//! Each trait is a thin request/response contract over the remote Phone
//! Manager service. HTTP implementations live in `crate::api`; the in-memory
//! implementations here back unit tests and offline runs.

pub mod devices;
pub mod geofences;
pub mod groups;
pub mod invites;

pub use devices::{DeviceRepository, InMemoryDeviceRepository};
pub use geofences::{
    GeofenceLookup, GeofenceRepository, InMemoryGeofenceRepository, TransitionReport,
    TransitionReporter,
};
pub use groups::{GroupRepository, InMemoryGroupRepository};
pub use invites::{InMemoryInviteRepository, InviteRepository};

use thiserror::Error;

/// Errors surfaced by repository calls.
///
/// Every call produces exactly one success or failure; no unchecked errors
/// cross into the state layer.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}
