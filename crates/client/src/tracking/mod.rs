//! Live device-tracking state: periodic refresh and the tracking toggle.

pub mod poller;

pub use poller::{DeviceTrackingPoller, DeviceTrackingState, ToggleStatus};
