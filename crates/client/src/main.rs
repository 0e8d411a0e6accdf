use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use phone_manager_client::api::{ApiClient, HttpDeviceRepository, HttpGeofenceRepository};
use phone_manager_client::config::ClientConfig;
use phone_manager_client::geofence::{GeofenceRegistry, TransitionDispatcher};
use phone_manager_client::logging;
use phone_manager_client::state::GeofencesModel;
use phone_manager_client::tracking::DeviceTrackingPoller;
use platform::geofencing::InMemoryGeofencingProvider;
use platform::notifications::LogNotifier;
use platform::permissions::StaticPermissions;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = ClientConfig::load()?;

    // Initialize logging
    logging::init_logging(&config.logging);

    info!("Starting Phone Manager agent v{}", env!("CARGO_PKG_VERSION"));

    let client = Arc::new(ApiClient::new(&config.api)?);
    let geofences = Arc::new(HttpGeofenceRepository::new(client.clone()));
    let devices = Arc::new(HttpDeviceRepository::new(client.clone()));

    // Headless runs use the in-memory monitor in place of a native one.
    let (provider, mut transitions) = InMemoryGeofencingProvider::new();
    let registry = Arc::new(GeofenceRegistry::new(
        Arc::new(StaticPermissions::granted()),
        Arc::new(provider),
    ));

    // Mirror the remote desired state into the monitor.
    let geofence_screen = GeofencesModel::new(geofences.clone(), registry.clone());
    geofence_screen.load().await;
    geofence_screen.sync_registered().await;

    let dispatcher = TransitionDispatcher::new(
        config.device.device_id,
        geofences.clone(),
        Arc::new(LogNotifier::new()),
    )
    .with_reporter(geofences.clone());

    let poller = Arc::new(DeviceTrackingPoller::new(
        devices,
        config.device.group_id.clone(),
        config.device.device_id,
        Duration::from_secs(config.polling.location_refresh_secs),
    ));
    poller.load_settings().await;
    poller.start_polling();

    info!("Agent running; press Ctrl-C to stop");
    loop {
        tokio::select! {
            Some(event) = transitions.recv() => dispatcher.handle_event(event).await,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poller.stop_polling();
    if let Err(e) = registry.remove_all_geofences().await {
        warn!(error = %e, "Failed to remove geofences during shutdown");
    }
    info!("Agent stopped");

    Ok(())
}
