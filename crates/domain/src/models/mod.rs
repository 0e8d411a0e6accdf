//! Domain models for the Phone Manager client.

pub mod device;
pub mod geofence;
pub mod group;
pub mod invite;
pub mod setting;
pub mod transition;

pub use device::{Device, LocationPoint, TrackingSettings};
pub use geofence::{Geofence, GeofenceError, TransitionKind};
pub use group::{Group, GroupMembership, GroupRole};
pub use invite::{CreateInviteRequest, GroupInvite, RedeemInviteRequest};
pub use setting::{DeviceSetting, SettingsTemplate};
pub use transition::TransitionEvent;
