//! Keeps the native geofencing subsystem synchronized with the desired set
//! of geofences.
//!
//! The remote service owns the geofence records; this registry mirrors them
//! into the platform monitor and reports permission and registration
//! failures. Platform failures are returned to the caller unmodified and
//! never retried here.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use domain::models::{Geofence, TransitionKind};
use platform::geofencing::{
    transition_flags, GeofencingError, GeofencingProvider, GeofencingRequest, NativeGeofence,
    INITIAL_TRIGGER_DWELL, INITIAL_TRIGGER_ENTER,
};
use platform::permissions::PermissionProbe;

/// Loitering delay for dwell transitions (5 minutes).
const DWELL_LOITERING_DELAY: Duration = Duration::from_secs(5 * 60);

/// Errors raised when synchronizing geofences into the platform monitor.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Missing required location permissions for geofencing")]
    PermissionDenied,

    #[error(transparent)]
    Platform(#[from] GeofencingError),
}

/// Synchronizes desired geofences with the native monitoring subsystem.
pub struct GeofenceRegistry {
    permissions: Arc<dyn PermissionProbe>,
    provider: Arc<dyn GeofencingProvider>,
}

impl GeofenceRegistry {
    pub fn new(
        permissions: Arc<dyn PermissionProbe>,
        provider: Arc<dyn GeofencingProvider>,
    ) -> Self {
        Self {
            permissions,
            provider,
        }
    }

    /// True only if both fine-location and background-location authorization
    /// are granted. Pure query, no side effects.
    pub fn has_required_permissions(&self) -> bool {
        self.permissions.fine_location_granted() && self.permissions.background_location_granted()
    }

    /// Registers a single geofence with the native monitor.
    pub async fn add_geofence(&self, geofence: &Geofence) -> Result<(), RegistryError> {
        self.add_geofences(std::slice::from_ref(geofence)).await
    }

    /// Registers geofences with the native monitor, overwriting entries with
    /// the same id. An empty slice is a no-op success. Fails with
    /// `PermissionDenied` before touching the platform when authorization is
    /// missing.
    pub async fn add_geofences(&self, geofences: &[Geofence]) -> Result<(), RegistryError> {
        if geofences.is_empty() {
            return Ok(());
        }

        if !self.has_required_permissions() {
            return Err(RegistryError::PermissionDenied);
        }

        let request = GeofencingRequest {
            initial_trigger: INITIAL_TRIGGER_ENTER | INITIAL_TRIGGER_DWELL,
            geofences: geofences.iter().map(to_native).collect(),
        };

        match self.provider.register(request).await {
            Ok(()) => {
                info!(count = geofences.len(), "Successfully added geofence(s)");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to add geofences");
                Err(e.into())
            }
        }
    }

    /// Removes a single geofence from the native monitor.
    pub async fn remove_geofence(&self, geofence_id: &str) -> Result<(), RegistryError> {
        self.remove_geofences(&[geofence_id.to_string()]).await
    }

    /// Removes geofences by id. An empty slice is a no-op success.
    pub async fn remove_geofences(&self, geofence_ids: &[String]) -> Result<(), RegistryError> {
        if geofence_ids.is_empty() {
            return Ok(());
        }

        match self.provider.unregister(geofence_ids).await {
            Ok(()) => {
                info!(count = geofence_ids.len(), "Successfully removed geofence(s)");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to remove geofences");
                Err(e.into())
            }
        }
    }

    /// Removes every geofence registered through this app's event sink.
    pub async fn remove_all_geofences(&self) -> Result<(), RegistryError> {
        match self.provider.unregister_all().await {
            Ok(()) => {
                info!("Successfully removed all geofences");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to remove all geofences");
                Err(e.into())
            }
        }
    }
}

/// Converts a domain geofence to the platform's circular-region form.
fn to_native(geofence: &Geofence) -> NativeGeofence {
    let loitering_delay = if geofence.monitors(TransitionKind::Dwell) {
        Some(DWELL_LOITERING_DELAY)
    } else {
        None
    };

    NativeGeofence {
        request_id: geofence.id.clone(),
        latitude: geofence.latitude,
        longitude: geofence.longitude,
        radius_meters: geofence.radius_meters,
        transition_flags: transition_flags(&geofence.transitions),
        loitering_delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::geofencing::{
        InMemoryGeofencingProvider, TRANSITION_DWELL, TRANSITION_ENTER, TRANSITION_EXIT,
    };
    use platform::permissions::StaticPermissions;

    fn fence(id: &str, transitions: Vec<TransitionKind>) -> Geofence {
        Geofence::new(id, "Home", 48.2082, 16.3738, 150.0, transitions).expect("valid geofence")
    }

    fn registry_with(
        permissions: StaticPermissions,
    ) -> (GeofenceRegistry, Arc<InMemoryGeofencingProvider>) {
        let (provider, _rx) = InMemoryGeofencingProvider::new();
        let provider = Arc::new(provider);
        let registry = GeofenceRegistry::new(Arc::new(permissions), provider.clone());
        (registry, provider)
    }

    #[test]
    fn test_has_required_permissions_needs_both() {
        let (registry, _) = registry_with(StaticPermissions::granted());
        assert!(registry.has_required_permissions());

        let (registry, _) = registry_with(StaticPermissions {
            fine_location: true,
            background_location: false,
        });
        assert!(!registry.has_required_permissions());

        let (registry, _) = registry_with(StaticPermissions::denied());
        assert!(!registry.has_required_permissions());
    }

    #[tokio::test]
    async fn test_add_empty_list_skips_provider() {
        let (registry, provider) = registry_with(StaticPermissions::granted());
        registry.add_geofences(&[]).await.unwrap();
        assert_eq!(provider.register_call_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_empty_list_skips_provider() {
        let (registry, provider) = registry_with(StaticPermissions::granted());
        registry.remove_geofences(&[]).await.unwrap();
        assert_eq!(provider.unregister_call_count(), 0);
    }

    #[tokio::test]
    async fn test_add_without_permissions_fails_before_provider() {
        let (registry, provider) = registry_with(StaticPermissions::denied());
        let err = registry
            .add_geofences(&[fence("geo-1", vec![TransitionKind::Enter])])
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::PermissionDenied));
        assert_eq!(provider.register_call_count(), 0);
    }

    #[tokio::test]
    async fn test_add_registers_with_provider() {
        let (registry, provider) = registry_with(StaticPermissions::granted());
        registry
            .add_geofences(&[
                fence("geo-1", vec![TransitionKind::Enter]),
                fence("geo-2", vec![TransitionKind::Exit]),
            ])
            .await
            .unwrap();

        assert_eq!(
            provider.registered_ids(),
            vec!["geo-1".to_string(), "geo-2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_platform_error_propagates_verbatim() {
        let (registry, provider) = registry_with(StaticPermissions::granted());
        provider.fail_next_with(GeofencingError::TooManyGeofences);

        let err = registry
            .add_geofences(&[fence("geo-1", vec![TransitionKind::Enter])])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::Platform(GeofencingError::TooManyGeofences)
        ));
    }

    #[tokio::test]
    async fn test_remove_and_remove_all() {
        let (registry, provider) = registry_with(StaticPermissions::granted());
        registry
            .add_geofences(&[
                fence("geo-1", vec![TransitionKind::Enter]),
                fence("geo-2", vec![TransitionKind::Enter]),
            ])
            .await
            .unwrap();

        registry
            .remove_geofences(&["geo-1".to_string()])
            .await
            .unwrap();
        assert_eq!(provider.registered_ids(), vec!["geo-2".to_string()]);

        registry.remove_all_geofences().await.unwrap();
        assert!(provider.registered_ids().is_empty());
    }

    #[test]
    fn test_to_native_sets_flags_and_dwell_delay() {
        let all = fence(
            "geo-1",
            vec![
                TransitionKind::Enter,
                TransitionKind::Exit,
                TransitionKind::Dwell,
            ],
        );
        let native = to_native(&all);
        assert_eq!(
            native.transition_flags,
            TRANSITION_ENTER | TRANSITION_EXIT | TRANSITION_DWELL
        );
        assert_eq!(native.loitering_delay, Some(DWELL_LOITERING_DELAY));

        let no_dwell = fence("geo-2", vec![TransitionKind::Enter]);
        let native = to_native(&no_dwell);
        assert_eq!(native.transition_flags, TRANSITION_ENTER);
        assert_eq!(native.loitering_delay, None);
    }
}
