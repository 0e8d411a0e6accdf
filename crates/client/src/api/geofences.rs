//! Geofence endpoints.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use domain::models::geofence::{CreateGeofenceRequest, ListGeofencesResponse};
use domain::models::Geofence;

use crate::repo::{
    GeofenceLookup, GeofenceRepository, RepositoryError, TransitionReport, TransitionReporter,
};

use super::http::ApiClient;

/// Response after reporting a transition event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTransitionEventResponse {
    event_id: Uuid,
    #[serde(default)]
    webhook_delivered: bool,
}

/// HTTP-backed geofence repository.
pub struct HttpGeofenceRepository {
    client: Arc<ApiClient>,
}

impl HttpGeofenceRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl GeofenceLookup for HttpGeofenceRepository {
    async fn get_geofence(&self, geofence_id: &str) -> Option<Geofence> {
        match self
            .client
            .get::<Geofence>(&format!("/api/v1/geofences/{}", geofence_id))
            .await
        {
            Ok(geofence) => Some(geofence),
            Err(e) => {
                // Not-found and transport failures are both treated as a
                // miss; the caller degrades to a placeholder name.
                warn!(geofence_id, error = %e, "Geofence lookup missed");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl GeofenceRepository for HttpGeofenceRepository {
    async fn list_geofences(&self) -> Result<Vec<Geofence>, RepositoryError> {
        let response: ListGeofencesResponse = self.client.get("/api/v1/geofences").await?;
        Ok(response.geofences)
    }

    async fn create_geofence(
        &self,
        request: CreateGeofenceRequest,
    ) -> Result<Geofence, RepositoryError> {
        Ok(self.client.post("/api/v1/geofences", &request).await?)
    }

    async fn delete_geofence(&self, geofence_id: &str) -> Result<(), RepositoryError> {
        Ok(self
            .client
            .delete(&format!("/api/v1/geofences/{}", geofence_id))
            .await?)
    }
}

#[async_trait::async_trait]
impl TransitionReporter for HttpGeofenceRepository {
    async fn report(&self, report: TransitionReport) -> Result<(), RepositoryError> {
        let response: CreateTransitionEventResponse = self
            .client
            .post("/api/v1/geofence-events", &report)
            .await?;
        debug!(
            event_id = %response.event_id,
            webhook_delivered = response.webhook_delivered,
            "Geofence event sent to backend"
        );
        Ok(())
    }
}
