//! Periodic device-state refresh with an explicit start/stop lifecycle.
//!
//! One sequential loop per poller: fetch, wait, repeat. Cancellation is
//! cooperative - the request flag is checked once per iteration before each
//! fetch, so an in-flight fetch completes before a stop takes effect. The
//! loop must be stopped on screen teardown.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use domain::models::{Device, LocationPoint};

use crate::repo::DeviceRepository;

/// Whether a tracking toggle is in flight.
///
/// The UI disables the control while `Toggling` so concurrent requests
/// cannot race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleStatus {
    Idle,
    Toggling,
}

impl Default for ToggleStatus {
    fn default() -> Self {
        ToggleStatus::Idle
    }
}

/// Snapshot of a device's tracking state, published to observers.
#[derive(Debug, Clone, Default)]
pub struct DeviceTrackingState {
    pub device: Option<Device>,
    pub location: Option<LocationPoint>,
    pub last_seen_at: Option<DateTime<Utc>>,
    /// None until the initial settings load succeeds.
    pub tracking_enabled: Option<bool>,
    pub toggle_status: ToggleStatus,
    /// One-shot confirmation flag; the UI clears it after display.
    pub toggle_success: bool,
    pub toggle_error: Option<String>,
}

/// Polls a device's remote state and republishes it to observers.
pub struct DeviceTrackingPoller {
    repo: Arc<dyn DeviceRepository>,
    group_id: String,
    device_id: Uuid,
    interval: Duration,
    state_tx: watch::Sender<DeviceTrackingState>,
    polling: Arc<AtomicBool>,
    epoch: Arc<AtomicU64>,
}

impl DeviceTrackingPoller {
    pub fn new(
        repo: Arc<dyn DeviceRepository>,
        group_id: impl Into<String>,
        device_id: Uuid,
        interval: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(DeviceTrackingState::default());
        Self {
            repo,
            group_id: group_id.into(),
            device_id,
            interval,
            state_tx,
            polling: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Latest-value-wins observable of the tracking state. Late subscribers
    /// receive the current snapshot immediately.
    pub fn subscribe(&self) -> watch::Receiver<DeviceTrackingState> {
        self.state_tx.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::SeqCst)
    }

    /// Starts the refresh loop. Idempotent: a second call while already
    /// polling is a no-op.
    pub fn start_polling(&self) {
        if self.polling.swap(true, Ordering::SeqCst) {
            return;
        }
        let my_epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let repo = Arc::clone(&self.repo);
        let group_id = self.group_id.clone();
        let device_id = self.device_id;
        let interval = self.interval;
        let state_tx = self.state_tx.clone();
        let polling = Arc::clone(&self.polling);
        let epoch = Arc::clone(&self.epoch);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; the first fetch happens
            // one full interval after start.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                // Checked before each fetch; a stale loop from an earlier
                // start/stop cycle also exits here.
                if !polling.load(Ordering::SeqCst) || epoch.load(Ordering::SeqCst) != my_epoch {
                    break;
                }
                refresh_into(&repo, &group_id, device_id, &state_tx).await;
            }
            debug!(device_id = %device_id, "Device tracking poll loop exited");
        });
    }

    /// Requests the loop to stop. The loop observes this before its next
    /// fetch and exits without fetching.
    pub fn stop_polling(&self) {
        self.polling.store(false, Ordering::SeqCst);
    }

    /// Re-fetches the device's current state and republishes it.
    /// Failures are logged and swallowed; the poll loop continues.
    pub async fn refresh(&self) {
        refresh_into(&self.repo, &self.group_id, self.device_id, &self.state_tx).await;
    }

    /// Initial fetch of the tracking settings. A failure leaves the value
    /// unknown without surfacing an error.
    pub async fn load_settings(&self) {
        match self.repo.get_tracking_settings(self.device_id).await {
            Ok(settings) => {
                debug!(
                    device_id = %self.device_id,
                    enabled = settings.tracking_enabled,
                    "Loaded tracking settings"
                );
                self.state_tx.send_modify(|state| {
                    state.tracking_enabled = Some(settings.tracking_enabled);
                });
            }
            Err(e) => {
                warn!(device_id = %self.device_id, error = %e, "Failed to load tracking settings");
            }
        }
    }

    /// Issues a single tracking toggle against the remote service.
    ///
    /// While in flight the state shows `Toggling`. On success the new value
    /// is adopted and the one-shot success flag is raised; on failure the
    /// error is surfaced and the user must re-invoke.
    pub async fn toggle_tracking(&self, enabled: bool) {
        if self.state_tx.borrow().toggle_status == ToggleStatus::Toggling {
            debug!("Ignoring toggle while a toggle is in flight");
            return;
        }

        self.state_tx.send_modify(|state| {
            state.toggle_status = ToggleStatus::Toggling;
            state.toggle_error = None;
        });

        match self.repo.toggle_tracking(self.device_id, enabled).await {
            Ok(()) => {
                info!(
                    device_id = %self.device_id,
                    enabled,
                    "Tracking toggled"
                );
                self.state_tx.send_modify(|state| {
                    state.tracking_enabled = Some(enabled);
                    state.toggle_status = ToggleStatus::Idle;
                    state.toggle_success = true;
                });
            }
            Err(e) => {
                error!(device_id = %self.device_id, error = %e, "Failed to toggle tracking");
                self.state_tx.send_modify(|state| {
                    state.toggle_status = ToggleStatus::Idle;
                    state.toggle_error = Some(e.to_string());
                });
            }
        }
    }

    /// Clears the one-shot success flag after the UI has shown it.
    pub fn clear_toggle_success(&self) {
        self.state_tx.send_modify(|state| {
            state.toggle_success = false;
        });
    }

    /// Clears the surfaced toggle error.
    pub fn clear_toggle_error(&self) {
        self.state_tx.send_modify(|state| {
            state.toggle_error = None;
        });
    }
}

async fn refresh_into(
    repo: &Arc<dyn DeviceRepository>,
    group_id: &str,
    device_id: Uuid,
    state_tx: &watch::Sender<DeviceTrackingState>,
) {
    match repo.get_group_devices(group_id).await {
        Ok(devices) => {
            if let Some(device) = devices.into_iter().find(|d| d.device_id == device_id) {
                state_tx.send_modify(|state| {
                    state.location = device.last_location;
                    state.last_seen_at = device.last_seen_at;
                    state.device = Some(device);
                });
            }
        }
        Err(e) => {
            warn!(device_id = %device_id, error = %e, "Failed to refresh device state");
        }
    }
}
