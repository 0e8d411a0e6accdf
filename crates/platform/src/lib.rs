//! Host-platform capability boundary for the Phone Manager client.
//!
//! The client core never calls platform services directly. This crate
//! defines the traits the core consumes:
//! - `GeofencingProvider` - the native geofence monitoring subsystem
//! - `Notifier` - the notification subsystem
//! - `PermissionProbe` - location authorization state
//!
//! In-memory implementations are included for tests and the headless agent.

pub mod geofencing;
pub mod notifications;
pub mod permissions;

pub use geofencing::{
    GeofencingError, GeofencingProvider, GeofencingRequest, InMemoryGeofencingProvider,
    NativeGeofence, RawGeofencingEvent,
};
pub use notifications::{
    Importance, LogNotifier, Notification, NotificationChannel, Notifier, RecordingNotifier,
};
pub use permissions::{PermissionProbe, StaticPermissions};
