//! HTTP wrappers around the remote Phone Manager API.
//!
//! Thin request/response plumbing: every repository trait in `crate::repo`
//! has an HTTP implementation here. All payloads are JSON; authentication is
//! the X-API-Key header.

pub mod devices;
pub mod geofences;
pub mod groups;
pub mod http;
pub mod invites;

pub use devices::HttpDeviceRepository;
pub use geofences::HttpGeofenceRepository;
pub use groups::HttpGroupRepository;
pub use http::{ApiClient, ApiError};
pub use invites::HttpInviteRepository;
