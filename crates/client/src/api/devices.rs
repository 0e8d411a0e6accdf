//! Device endpoints.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::models::{Device, TrackingSettings};

use crate::repo::{DeviceRepository, RepositoryError};

use super::http::ApiClient;

/// Response for the group-devices listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetDevicesResponse {
    devices: Vec<Device>,
    #[allow(dead_code)]
    total: usize,
}

/// Body for the tracking toggle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleTrackingRequest {
    tracking_enabled: bool,
}

/// HTTP-backed device repository.
pub struct HttpDeviceRepository {
    client: Arc<ApiClient>,
}

impl HttpDeviceRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DeviceRepository for HttpDeviceRepository {
    async fn get_group_devices(&self, group_id: &str) -> Result<Vec<Device>, RepositoryError> {
        let response: GetDevicesResponse = self
            .client
            .get(&format!("/api/v1/devices?groupId={}", group_id))
            .await?;
        Ok(response.devices)
    }

    async fn get_tracking_settings(
        &self,
        device_id: Uuid,
    ) -> Result<TrackingSettings, RepositoryError> {
        Ok(self
            .client
            .get(&format!("/api/v1/devices/{}/settings/tracking", device_id))
            .await?)
    }

    async fn toggle_tracking(
        &self,
        device_id: Uuid,
        enabled: bool,
    ) -> Result<(), RepositoryError> {
        Ok(self
            .client
            .put_no_content(
                &format!("/api/v1/devices/{}/settings/tracking", device_id),
                &ToggleTrackingRequest {
                    tracking_enabled: enabled,
                },
            )
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_request_wire_format() {
        let body = ToggleTrackingRequest {
            tracking_enabled: true,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"trackingEnabled":true}"#
        );
    }

    #[test]
    fn test_devices_response_deserialization() {
        let json = r#"{
            "devices": [{
                "deviceId": "550e8400-e29b-41d4-a716-446655440000",
                "ownerId": "550e8400-e29b-41d4-a716-446655440001",
                "displayName": "Phone",
                "groupId": "family",
                "platform": "android",
                "active": true
            }],
            "total": 1
        }"#;

        let response: GetDevicesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.devices.len(), 1);
        assert_eq!(response.devices[0].display_name, "Phone");
    }
}
