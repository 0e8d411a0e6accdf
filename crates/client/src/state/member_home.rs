//! State model for viewing another member's home screen.
//!
//! Loads the member's roster entry and devices, then delegates live
//! location/tracking state to a `DeviceTrackingPoller` bound to the primary
//! device. `stop_polling` must be called on screen teardown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, warn};
use uuid::Uuid;

use domain::models::{Device, GroupMembership};

use crate::repo::{DeviceRepository, GroupRepository};
use crate::tracking::DeviceTrackingPoller;

/// Snapshot of the member-home screen.
#[derive(Debug, Clone, Default)]
pub struct MemberHomeState {
    pub member: Option<GroupMembership>,
    pub devices: Vec<Device>,
    pub primary_device: Option<Device>,
    pub is_loading: bool,
    pub no_devices_registered: bool,
    pub error: Option<String>,
}

/// State model for a member's home screen.
pub struct MemberHomeModel {
    groups: Arc<dyn GroupRepository>,
    devices: Arc<dyn DeviceRepository>,
    group_id: String,
    user_id: Uuid,
    poll_interval: Duration,
    state_tx: watch::Sender<MemberHomeState>,
    tracker: Mutex<Option<Arc<DeviceTrackingPoller>>>,
}

impl MemberHomeModel {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        devices: Arc<dyn DeviceRepository>,
        group_id: impl Into<String>,
        user_id: Uuid,
        poll_interval: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(MemberHomeState::default());
        Self {
            groups,
            devices,
            group_id: group_id.into(),
            user_id,
            poll_interval,
            state_tx,
            tracker: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MemberHomeState> {
        self.state_tx.subscribe()
    }

    /// The live tracker for the primary device, once loading succeeded.
    pub fn tracker(&self) -> Option<Arc<DeviceTrackingPoller>> {
        self.tracker.lock().expect("tracker lock").clone()
    }

    /// Loads the member's roster entry and devices, then starts polling.
    pub async fn load(&self) {
        self.state_tx.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        match self.groups.get_group_members(&self.group_id).await {
            Ok(members) => match members.into_iter().find(|m| m.user_id == self.user_id) {
                Some(member) => {
                    debug!(user_id = %self.user_id, name = %member.display_name, "Found member");
                    self.state_tx.send_modify(|state| {
                        state.member = Some(member);
                    });
                    self.load_devices().await;
                }
                None => {
                    warn!(user_id = %self.user_id, group_id = %self.group_id, "User not found in group");
                    self.state_tx.send_modify(|state| {
                        state.is_loading = false;
                        state.error = Some("User not found in this group".to_string());
                    });
                }
            },
            Err(e) => {
                error!(error = %e, "Failed to load group members");
                self.state_tx.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    async fn load_devices(&self) {
        match self.devices.get_group_devices(&self.group_id).await {
            Ok(devices) => {
                let user_devices: Vec<Device> = devices
                    .into_iter()
                    .filter(|d| d.owner_id == self.user_id)
                    .collect();
                debug!(count = user_devices.len(), user_id = %self.user_id, "Found devices for user");

                match user_devices.first().cloned() {
                    Some(primary) => {
                        self.state_tx.send_modify(|state| {
                            state.is_loading = false;
                            state.devices = user_devices;
                            state.primary_device = Some(primary.clone());
                            state.error = None;
                        });
                        self.start_tracking(primary.device_id).await;
                    }
                    None => {
                        self.state_tx.send_modify(|state| {
                            state.is_loading = false;
                            state.no_devices_registered = true;
                            state.error = None;
                        });
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to load user devices");
                self.state_tx.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    async fn start_tracking(&self, device_id: Uuid) {
        let poller = Arc::new(DeviceTrackingPoller::new(
            Arc::clone(&self.devices),
            self.group_id.clone(),
            device_id,
            self.poll_interval,
        ));
        poller.load_settings().await;
        poller.refresh().await;
        poller.start_polling();
        *self.tracker.lock().expect("tracker lock") = Some(poller);
    }

    /// Stops the location poll loop. Must be called on screen teardown.
    pub fn stop_polling(&self) {
        if let Some(tracker) = self.tracker.lock().expect("tracker lock").as_ref() {
            tracker.stop_polling();
        }
    }

    /// Retry loading after a failure.
    pub async fn retry(&self) {
        self.load().await;
    }
}
