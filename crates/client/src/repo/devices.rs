//! Device repository contract and in-memory implementation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use domain::models::{Device, TrackingSettings};

use super::RepositoryError;

/// Device-state contract against the remote service.
#[async_trait::async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn get_group_devices(&self, group_id: &str) -> Result<Vec<Device>, RepositoryError>;

    async fn get_tracking_settings(
        &self,
        device_id: Uuid,
    ) -> Result<TrackingSettings, RepositoryError>;

    async fn toggle_tracking(
        &self,
        device_id: Uuid,
        enabled: bool,
    ) -> Result<(), RepositoryError>;
}

/// In-memory device repository for tests and offline runs.
#[derive(Default)]
pub struct InMemoryDeviceRepository {
    devices: Mutex<Vec<Device>>,
    tracking: Mutex<std::collections::HashMap<Uuid, bool>>,
    fetch_calls: AtomicUsize,
    toggle_calls: AtomicUsize,
    fail_fetches: Mutex<bool>,
    fail_toggles: Mutex<bool>,
}

impl InMemoryDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_device(&self, device: Device) {
        self.tracking
            .lock()
            .expect("repo lock")
            .insert(device.device_id, true);
        self.devices.lock().expect("repo lock").push(device);
    }

    /// Replaces a device record in place (e.g. to simulate movement).
    pub fn update_device(&self, device: Device) {
        let mut devices = self.devices.lock().expect("repo lock");
        if let Some(existing) = devices.iter_mut().find(|d| d.device_id == device.device_id) {
            *existing = device;
        }
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn toggle_call_count(&self) -> usize {
        self.toggle_calls.load(Ordering::SeqCst)
    }

    pub fn fail_fetches(&self, fail: bool) {
        *self.fail_fetches.lock().expect("repo lock") = fail;
    }

    pub fn fail_toggles(&self, fail: bool) {
        *self.fail_toggles.lock().expect("repo lock") = fail;
    }

    pub fn tracking_enabled(&self, device_id: Uuid) -> Option<bool> {
        self.tracking
            .lock()
            .expect("repo lock")
            .get(&device_id)
            .copied()
    }
}

#[async_trait::async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn get_group_devices(&self, group_id: &str) -> Result<Vec<Device>, RepositoryError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_fetches.lock().expect("repo lock") {
            return Err(RepositoryError::Network("connection reset".to_string()));
        }
        Ok(self
            .devices
            .lock()
            .expect("repo lock")
            .iter()
            .filter(|d| d.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn get_tracking_settings(
        &self,
        device_id: Uuid,
    ) -> Result<TrackingSettings, RepositoryError> {
        let tracking = self.tracking.lock().expect("repo lock");
        tracking
            .get(&device_id)
            .map(|&tracking_enabled| TrackingSettings { tracking_enabled })
            .ok_or_else(|| RepositoryError::NotFound(format!("device {}", device_id)))
    }

    async fn toggle_tracking(
        &self,
        device_id: Uuid,
        enabled: bool,
    ) -> Result<(), RepositoryError> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_toggles.lock().expect("repo lock") {
            return Err(RepositoryError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        self.tracking
            .lock()
            .expect("repo lock")
            .insert(device_id, enabled);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_device(group_id: &str) -> Device {
        Device {
            device_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            display_name: "Phone".to_string(),
            group_id: group_id.to_string(),
            platform: "android".to_string(),
            active: true,
            last_location: None,
            last_seen_at: None,
        }
    }

    #[tokio::test]
    async fn test_group_devices_filters_by_group() {
        let repo = InMemoryDeviceRepository::new();
        repo.insert_device(sample_device("family"));
        repo.insert_device(sample_device("work"));

        let devices = repo.get_group_devices("family").await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].group_id, "family");
        assert_eq!(repo.fetch_call_count(), 1);
    }

    #[tokio::test]
    async fn test_toggle_tracking_updates_settings() {
        let repo = InMemoryDeviceRepository::new();
        let device = sample_device("family");
        let device_id = device.device_id;
        repo.insert_device(device);

        assert!(repo.get_tracking_settings(device_id).await.unwrap().tracking_enabled);

        repo.toggle_tracking(device_id, false).await.unwrap();
        assert!(!repo.get_tracking_settings(device_id).await.unwrap().tracking_enabled);
        assert_eq!(repo.toggle_call_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let repo = InMemoryDeviceRepository::new();
        repo.fail_fetches(true);
        assert!(repo.get_group_devices("family").await.is_err());

        repo.fail_toggles(true);
        let err = repo.toggle_tracking(Uuid::new_v4(), true).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Api { status: 503, .. }));
    }
}
