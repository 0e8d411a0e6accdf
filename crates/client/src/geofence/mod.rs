//! Geofence monitoring: registration sync and transition dispatch.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::TransitionDispatcher;
pub use registry::{GeofenceRegistry, RegistryError};
