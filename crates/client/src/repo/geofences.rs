//! Geofence repository contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::models::geofence::CreateGeofenceRequest;
use domain::models::{Geofence, TransitionKind};

use super::RepositoryError;

/// Name lookup used by the transition dispatcher.
///
/// Returns None for unknown ids; never errors for "not found". Transport
/// failures are treated as a miss as well - the dispatcher degrades to a
/// placeholder name instead of dropping the event.
#[async_trait::async_trait]
pub trait GeofenceLookup: Send + Sync {
    async fn get_geofence(&self, geofence_id: &str) -> Option<Geofence>;
}

/// Full geofence contract against the remote service.
#[async_trait::async_trait]
pub trait GeofenceRepository: GeofenceLookup {
    async fn list_geofences(&self) -> Result<Vec<Geofence>, RepositoryError>;

    async fn create_geofence(
        &self,
        request: CreateGeofenceRequest,
    ) -> Result<Geofence, RepositoryError>;

    async fn delete_geofence(&self, geofence_id: &str) -> Result<(), RepositoryError>;
}

/// A transition occurrence reported back to the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionReport {
    pub device_id: Uuid,
    pub geofence_id: String,
    pub event_type: TransitionKind,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Reports transition occurrences to the remote service.
///
/// Best-effort: a failed report is logged by the caller and never blocks
/// notification emission.
#[async_trait::async_trait]
pub trait TransitionReporter: Send + Sync {
    async fn report(&self, report: TransitionReport) -> Result<(), RepositoryError>;
}

/// In-memory geofence repository for tests and offline runs.
#[derive(Default)]
pub struct InMemoryGeofenceRepository {
    geofences: Mutex<HashMap<String, Geofence>>,
    reports: Mutex<Vec<TransitionReport>>,
    fail_lookups: Mutex<bool>,
}

impl InMemoryGeofenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a geofence.
    pub fn insert(&self, geofence: Geofence) {
        self.geofences
            .lock()
            .expect("repo lock")
            .insert(geofence.id.clone(), geofence);
    }

    /// Makes every name lookup miss, regardless of contents.
    pub fn fail_lookups(&self) {
        *self.fail_lookups.lock().expect("repo lock") = true;
    }

    /// Reports received so far.
    pub fn reports(&self) -> Vec<TransitionReport> {
        self.reports.lock().expect("repo lock").clone()
    }
}

#[async_trait::async_trait]
impl GeofenceLookup for InMemoryGeofenceRepository {
    async fn get_geofence(&self, geofence_id: &str) -> Option<Geofence> {
        if *self.fail_lookups.lock().expect("repo lock") {
            return None;
        }
        self.geofences
            .lock()
            .expect("repo lock")
            .get(geofence_id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl GeofenceRepository for InMemoryGeofenceRepository {
    async fn list_geofences(&self) -> Result<Vec<Geofence>, RepositoryError> {
        let mut fences: Vec<Geofence> = self
            .geofences
            .lock()
            .expect("repo lock")
            .values()
            .cloned()
            .collect();
        fences.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(fences)
    }

    async fn create_geofence(
        &self,
        request: CreateGeofenceRequest,
    ) -> Result<Geofence, RepositoryError> {
        let fence = Geofence {
            id: format!("geo-{}", Uuid::new_v4()),
            name: request.name,
            latitude: request.latitude,
            longitude: request.longitude,
            radius_meters: request.radius_meters,
            transitions: request.transitions,
            active: request.active,
        };
        self.insert(fence.clone());
        Ok(fence)
    }

    async fn delete_geofence(&self, geofence_id: &str) -> Result<(), RepositoryError> {
        self.geofences
            .lock()
            .expect("repo lock")
            .remove(geofence_id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("geofence {}", geofence_id)))
    }
}

#[async_trait::async_trait]
impl TransitionReporter for InMemoryGeofenceRepository {
    async fn report(&self, report: TransitionReport) -> Result<(), RepositoryError> {
        self.reports.lock().expect("repo lock").push(report);
        Ok(())
    }
}
