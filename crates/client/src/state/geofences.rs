//! State model for the geofence administration screen.
//!
//! Create/delete flow through the remote service first (it owns the
//! records), then the change is mirrored into the native monitor via the
//! registry. Registry failures surface as the screen's error message; the
//! remote record is kept either way.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, warn};
use validator::Validate;

use domain::models::geofence::CreateGeofenceRequest;
use domain::models::Geofence;

use crate::geofence::GeofenceRegistry;
use crate::repo::GeofenceRepository;

use super::validation_message;

/// Snapshot of the geofences screen.
#[derive(Debug, Clone, Default)]
pub struct GeofencesState {
    pub geofences: Vec<Geofence>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// State model for geofence administration.
pub struct GeofencesModel {
    repo: Arc<dyn GeofenceRepository>,
    registry: Arc<GeofenceRegistry>,
    state_tx: watch::Sender<GeofencesState>,
}

impl GeofencesModel {
    pub fn new(repo: Arc<dyn GeofenceRepository>, registry: Arc<GeofenceRegistry>) -> Self {
        let (state_tx, _) = watch::channel(GeofencesState::default());
        Self {
            repo,
            registry,
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GeofencesState> {
        self.state_tx.subscribe()
    }

    /// Loads the geofence list from the remote service.
    pub async fn load(&self) {
        self.state_tx.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        match self.repo.list_geofences().await {
            Ok(geofences) => {
                self.state_tx.send_modify(|state| {
                    state.is_loading = false;
                    state.geofences = geofences;
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to load geofences");
                self.state_tx.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    /// Registers every active geofence currently loaded into the native
    /// monitor. Used on startup to mirror the remote desired state.
    pub async fn sync_registered(&self) {
        let active: Vec<Geofence> = self
            .state_tx
            .borrow()
            .geofences
            .iter()
            .filter(|g| g.active)
            .cloned()
            .collect();

        if let Err(e) = self.registry.add_geofences(&active).await {
            warn!(error = %e, "Failed to mirror geofences into the native monitor");
            self.state_tx.send_modify(|state| {
                state.error = Some(e.to_string());
            });
        }
    }

    /// Creates a geofence on the remote service and registers it locally.
    pub async fn create(&self, request: CreateGeofenceRequest) {
        if let Err(errors) = request.validate() {
            self.state_tx.send_modify(|state| {
                state.error = Some(validation_message(&errors));
            });
            return;
        }

        match self.repo.create_geofence(request).await {
            Ok(geofence) => {
                self.state_tx.send_modify(|state| {
                    state.geofences.push(geofence.clone());
                    state.error = None;
                });

                if geofence.active {
                    if let Err(e) = self.registry.add_geofence(&geofence).await {
                        // The remote record exists; only the local mirror
                        // failed. Surface it so the user can retry.
                        warn!(geofence_id = %geofence.id, error = %e, "Failed to register created geofence");
                        self.state_tx.send_modify(|state| {
                            state.error = Some(e.to_string());
                        });
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to create geofence");
                self.state_tx.send_modify(|state| {
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    /// Deletes a geofence from the remote service and the native monitor.
    pub async fn delete(&self, geofence_id: &str) {
        match self.repo.delete_geofence(geofence_id).await {
            Ok(()) => {
                self.state_tx.send_modify(|state| {
                    state.geofences.retain(|g| g.id != geofence_id);
                    state.error = None;
                });

                if let Err(e) = self.registry.remove_geofence(geofence_id).await {
                    warn!(geofence_id, error = %e, "Failed to unregister deleted geofence");
                    self.state_tx.send_modify(|state| {
                        state.error = Some(e.to_string());
                    });
                }
            }
            Err(e) => {
                error!(geofence_id, error = %e, "Failed to delete geofence");
                self.state_tx.send_modify(|state| {
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    pub fn clear_error(&self) {
        self.state_tx.send_modify(|state| {
            state.error = None;
        });
    }
}
