//! Turns raw platform transition callbacks into user-visible notifications.
//!
//! Stateless across invocations. Malformed payloads are dropped with a log
//! line and never retried; the platform does not redeliver, so a dropped
//! occurrence is lost permanently.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use domain::models::{TransitionEvent, TransitionKind};
use platform::geofencing::{kind_from_code, status_code_string, RawGeofencingEvent};
use platform::notifications::{Importance, Notification, NotificationChannel, Notifier};
use shared::ids::notification_id;

use crate::repo::{GeofenceLookup, TransitionReport, TransitionReporter};

/// Channel all geofence alerts are posted on.
pub const GEOFENCE_CHANNEL_ID: &str = "geofence_alerts";

/// Display name used when the triggering geofence cannot be resolved.
pub const UNKNOWN_LOCATION_NAME: &str = "Unknown location";

fn geofence_channel() -> NotificationChannel {
    NotificationChannel {
        id: GEOFENCE_CHANNEL_ID.to_string(),
        name: "Geofence Alerts".to_string(),
        importance: Importance::High,
        vibration: true,
    }
}

/// Title and body for a transition notification.
fn notification_text(kind: TransitionKind, name: &str) -> (String, String) {
    match kind {
        TransitionKind::Enter => (
            format!("Entered: {}", name),
            format!("You have entered the {} area", name),
        ),
        TransitionKind::Exit => (
            format!("Left: {}", name),
            format!("You have left the {} area", name),
        ),
        TransitionKind::Dwell => (
            format!("At: {}", name),
            format!("You are staying in the {} area", name),
        ),
    }
}

/// Dispatches platform transition callbacks: parse, classify, validate,
/// resolve each triggering geofence's display name, and emit one
/// notification per geofence.
pub struct TransitionDispatcher {
    device_id: Uuid,
    lookup: Arc<dyn GeofenceLookup>,
    notifier: Arc<dyn Notifier>,
    reporter: Option<Arc<dyn TransitionReporter>>,
    channel_ready: tokio::sync::OnceCell<()>,
}

impl TransitionDispatcher {
    pub fn new(
        device_id: Uuid,
        lookup: Arc<dyn GeofenceLookup>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            device_id,
            lookup,
            notifier,
            reporter: None,
            channel_ready: tokio::sync::OnceCell::new(),
        }
    }

    /// Also report each occurrence to the remote service (best-effort).
    pub fn with_reporter(mut self, reporter: Arc<dyn TransitionReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Decodes and handles a raw callback payload.
    pub async fn handle_payload(&self, payload: &[u8]) {
        match serde_json::from_slice::<RawGeofencingEvent>(payload) {
            Ok(event) => self.handle_event(event).await,
            Err(e) => error!(error = %e, "Undecodable geofencing event payload"),
        }
    }

    /// Handles a decoded callback event.
    pub async fn handle_event(&self, event: RawGeofencingEvent) {
        if let Some(code) = event.error_code {
            error!(
                code,
                status = status_code_string(code),
                "Geofencing event carried an error"
            );
            return;
        }

        let kind = match kind_from_code(event.transition) {
            Some(kind) => kind,
            None => {
                warn!(code = event.transition, "Unknown geofence transition code");
                return;
            }
        };

        if event.triggering_ids.is_empty() {
            warn!("No triggering geofences in event");
            return;
        }

        info!(
            kind = %kind,
            count = event.triggering_ids.len(),
            "Geofence transition"
        );

        self.channel_ready
            .get_or_init(|| async {
                self.notifier.ensure_channel(geofence_channel()).await;
            })
            .await;

        let transition = TransitionEvent::new(kind, event.triggering_ids);
        let location = event
            .triggering_location
            .map(|l| (l.latitude, l.longitude));

        // One unit of work per triggering geofence: a lookup failure or
        // panic on one id must not suppress the others. Display order
        // across ids is not guaranteed.
        let mut tasks = Vec::with_capacity(transition.geofence_ids.len());
        for geofence_id in transition.geofence_ids {
            let lookup = Arc::clone(&self.lookup);
            let notifier = Arc::clone(&self.notifier);
            let reporter = self.reporter.clone();
            let device_id = self.device_id;
            tasks.push(tokio::spawn(async move {
                process_geofence(
                    kind,
                    geofence_id,
                    location,
                    device_id,
                    lookup,
                    notifier,
                    reporter,
                )
                .await;
            }));
        }

        for task in tasks {
            if task.await.is_err() {
                warn!("Geofence transition task panicked");
            }
        }
    }
}

async fn process_geofence(
    kind: TransitionKind,
    geofence_id: String,
    location: Option<(f64, f64)>,
    device_id: Uuid,
    lookup: Arc<dyn GeofenceLookup>,
    notifier: Arc<dyn Notifier>,
    reporter: Option<Arc<dyn TransitionReporter>>,
) {
    debug!(geofence_id = %geofence_id, kind = %kind, "Processing geofence transition");

    let name = match lookup.get_geofence(&geofence_id).await {
        Some(geofence) => geofence.name,
        None => UNKNOWN_LOCATION_NAME.to_string(),
    };

    if let Some(reporter) = reporter {
        let (latitude, longitude) = location.unwrap_or((0.0, 0.0));
        let report = TransitionReport {
            device_id,
            geofence_id: geofence_id.clone(),
            event_type: kind,
            timestamp: Utc::now(),
            latitude,
            longitude,
        };
        if let Err(e) = reporter.report(report).await {
            warn!(geofence_id = %geofence_id, error = %e, "Failed to report geofence transition");
        }
    }

    let (title, body) = notification_text(kind, &name);
    let id = notification_id(&geofence_id);
    notifier
        .notify(
            id,
            Notification {
                channel_id: GEOFENCE_CHANNEL_ID.to_string(),
                title: title.clone(),
                body,
                auto_cancel: true,
            },
        )
        .await;

    info!(notification_id = id, title = %title, "Sent geofence notification");
}
