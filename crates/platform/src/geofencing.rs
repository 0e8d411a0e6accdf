//! Native geofencing subsystem boundary.
//!
//! The platform monitors registered circular regions and delivers transition
//! events asynchronously to a single shared event sink, independently of the
//! app's lifecycle. Registration is keyed by geofence id with last-write-wins
//! overwrite semantics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use domain::models::TransitionKind;

/// Transition flag: device entered a region.
pub const TRANSITION_ENTER: i32 = 1;
/// Transition flag: device left a region.
pub const TRANSITION_EXIT: i32 = 2;
/// Transition flag: device stayed inside past the loitering delay.
pub const TRANSITION_DWELL: i32 = 4;

/// Initial-trigger flag: fire ENTER immediately if already inside.
pub const INITIAL_TRIGGER_ENTER: i32 = 1;
/// Initial-trigger flag: fire DWELL immediately if already inside.
pub const INITIAL_TRIGGER_DWELL: i32 = 4;

/// Status code: the geofencing service is not available.
pub const STATUS_NOT_AVAILABLE: i32 = 1000;
/// Status code: the per-app geofence quota is exhausted.
pub const STATUS_TOO_MANY_GEOFENCES: i32 = 1001;
/// Status code: too many callback targets registered.
pub const STATUS_TOO_MANY_PENDING_INTENTS: i32 = 1002;

/// Decodes a platform status code into a human-readable string.
pub fn status_code_string(code: i32) -> &'static str {
    match code {
        STATUS_NOT_AVAILABLE => "GEOFENCE_NOT_AVAILABLE",
        STATUS_TOO_MANY_GEOFENCES => "GEOFENCE_TOO_MANY_GEOFENCES",
        STATUS_TOO_MANY_PENDING_INTENTS => "GEOFENCE_TOO_MANY_PENDING_INTENTS",
        _ => "UNKNOWN_GEOFENCE_STATUS",
    }
}

/// Maps a raw transition code to a transition kind.
pub fn kind_from_code(code: i32) -> Option<TransitionKind> {
    match code {
        TRANSITION_ENTER => Some(TransitionKind::Enter),
        TRANSITION_EXIT => Some(TransitionKind::Exit),
        TRANSITION_DWELL => Some(TransitionKind::Dwell),
        _ => None,
    }
}

/// Builds the transition bitmask for a set of monitored kinds.
pub fn transition_flags(kinds: &[TransitionKind]) -> i32 {
    let mut flags = 0;
    if kinds.contains(&TransitionKind::Enter) {
        flags |= TRANSITION_ENTER;
    }
    if kinds.contains(&TransitionKind::Exit) {
        flags |= TRANSITION_EXIT;
    }
    if kinds.contains(&TransitionKind::Dwell) {
        flags |= TRANSITION_DWELL;
    }
    flags
}

/// Errors the native geofencing subsystem can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeofencingError {
    #[error("Geofencing service is not available")]
    NotAvailable,

    #[error("Too many geofences registered")]
    TooManyGeofences,

    #[error("Too many callback targets registered")]
    TooManyPendingIntents,

    #[error("Security exception: {0}")]
    Security(String),
}

impl GeofencingError {
    /// The platform status code for this error.
    pub fn status_code(&self) -> i32 {
        match self {
            GeofencingError::NotAvailable => STATUS_NOT_AVAILABLE,
            GeofencingError::TooManyGeofences => STATUS_TOO_MANY_GEOFENCES,
            GeofencingError::TooManyPendingIntents => STATUS_TOO_MANY_PENDING_INTENTS,
            GeofencingError::Security(_) => STATUS_NOT_AVAILABLE,
        }
    }
}

/// The platform's circular-region representation of a geofence.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeGeofence {
    pub request_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f32,
    /// Bitmask of TRANSITION_* flags.
    pub transition_flags: i32,
    /// Minimum time inside before a DWELL transition fires.
    pub loitering_delay: Option<Duration>,
}

/// A registration request: regions plus the initial-trigger policy.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofencingRequest {
    /// Bitmask of INITIAL_TRIGGER_* flags.
    pub initial_trigger: i32,
    pub geofences: Vec<NativeGeofence>,
}

/// Position in a raw event payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Raw payload delivered to the shared event sink.
///
/// Decoding and classification happen in the dispatcher; the platform makes
/// no guarantees beyond "this is what the callback carried".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawGeofencingEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,

    #[serde(default)]
    pub transition: i32,

    #[serde(default)]
    pub triggering_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggering_location: Option<RawLocation>,
}

impl RawGeofencingEvent {
    pub fn transition(kind_code: i32, triggering_ids: Vec<String>) -> Self {
        Self {
            error_code: None,
            transition: kind_code,
            triggering_ids,
            triggering_location: None,
        }
    }

    pub fn error(code: i32) -> Self {
        Self {
            error_code: Some(code),
            transition: 0,
            triggering_ids: Vec::new(),
            triggering_location: None,
        }
    }
}

/// Native geofence monitoring subsystem.
///
/// One shared event sink receives transitions for all registered geofences;
/// there is no per-geofence callback. Concurrent calls against overlapping
/// ids are serialized by the provider, and registration is eventually
/// consistent with the last call to complete.
#[async_trait::async_trait]
pub trait GeofencingProvider: Send + Sync {
    /// Registers or overwrites regions keyed by geofence id.
    async fn register(&self, request: GeofencingRequest) -> Result<(), GeofencingError>;

    /// Removes the regions with the given ids. Unknown ids are ignored.
    async fn unregister(&self, ids: &[String]) -> Result<(), GeofencingError>;

    /// Removes every region registered through this provider's sink.
    async fn unregister_all(&self) -> Result<(), GeofencingError>;
}

struct MonitoredRegion {
    fence: NativeGeofence,
    inside: bool,
    entered_at: Option<Instant>,
    dwell_fired: bool,
}

struct ProviderState {
    regions: HashMap<String, MonitoredRegion>,
    last_position: Option<(f64, f64)>,
    fail_next: Option<GeofencingError>,
}

/// In-memory geofencing provider.
///
/// Holds the registration table and evaluates transitions against simulated
/// positions using haversine distance. Used by unit tests and by the headless
/// agent binary in place of a native monitor.
pub struct InMemoryGeofencingProvider {
    state: Mutex<ProviderState>,
    events: mpsc::UnboundedSender<RawGeofencingEvent>,
    register_calls: AtomicUsize,
    unregister_calls: AtomicUsize,
    max_geofences: usize,
}

/// Default per-app geofence quota.
const DEFAULT_MAX_GEOFENCES: usize = 100;

impl InMemoryGeofencingProvider {
    /// Creates a provider and the receiving half of its event sink.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RawGeofencingEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let provider = Self {
            state: Mutex::new(ProviderState {
                regions: HashMap::new(),
                last_position: None,
                fail_next: None,
            }),
            events: tx,
            register_calls: AtomicUsize::new(0),
            unregister_calls: AtomicUsize::new(0),
            max_geofences: DEFAULT_MAX_GEOFENCES,
        };
        (provider, rx)
    }

    /// Makes the next register/unregister call fail with `error`.
    pub fn fail_next_with(&self, error: GeofencingError) {
        self.state.lock().expect("provider lock").fail_next = Some(error);
    }

    /// Number of register calls observed.
    pub fn register_call_count(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    /// Number of unregister calls observed (including unregister_all).
    pub fn unregister_call_count(&self) -> usize {
        self.unregister_calls.load(Ordering::SeqCst)
    }

    /// Ids currently registered, sorted.
    pub fn registered_ids(&self) -> Vec<String> {
        let state = self.state.lock().expect("provider lock");
        let mut ids: Vec<String> = state.regions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Feeds a simulated device position and emits any resulting transitions
    /// to the event sink.
    pub fn update_position(&self, latitude: f64, longitude: f64) {
        let mut state = self.state.lock().expect("provider lock");
        state.last_position = Some((latitude, longitude));

        let here = Point::new(longitude, latitude);
        let mut entered: Vec<String> = Vec::new();
        let mut exited: Vec<String> = Vec::new();
        let mut dwelled: Vec<String> = Vec::new();

        for region in state.regions.values_mut() {
            let center = Point::new(region.fence.longitude, region.fence.latitude);
            let inside_now = here.haversine_distance(&center) <= region.fence.radius_meters as f64;

            if inside_now && !region.inside {
                region.inside = true;
                region.entered_at = Some(Instant::now());
                region.dwell_fired = false;
                if region.fence.transition_flags & TRANSITION_ENTER != 0 {
                    entered.push(region.fence.request_id.clone());
                }
            } else if !inside_now && region.inside {
                region.inside = false;
                region.entered_at = None;
                region.dwell_fired = false;
                if region.fence.transition_flags & TRANSITION_EXIT != 0 {
                    exited.push(region.fence.request_id.clone());
                }
            } else if inside_now && !region.dwell_fired {
                let loitering = region.fence.loitering_delay.unwrap_or(Duration::ZERO);
                let stayed = region
                    .entered_at
                    .map(|at| at.elapsed() >= loitering)
                    .unwrap_or(false);
                if stayed && region.fence.transition_flags & TRANSITION_DWELL != 0 {
                    region.dwell_fired = true;
                    dwelled.push(region.fence.request_id.clone());
                }
            }
        }
        drop(state);

        self.emit(TRANSITION_ENTER, entered, latitude, longitude);
        self.emit(TRANSITION_EXIT, exited, latitude, longitude);
        self.emit(TRANSITION_DWELL, dwelled, latitude, longitude);
    }

    fn emit(&self, transition: i32, ids: Vec<String>, latitude: f64, longitude: f64) {
        if ids.is_empty() {
            return;
        }
        debug!(transition, count = ids.len(), "Emitting geofence transition");
        let event = RawGeofencingEvent {
            error_code: None,
            transition,
            triggering_ids: ids,
            triggering_location: Some(RawLocation {
                latitude,
                longitude,
            }),
        };
        // Receiver gone means the app is shutting down; events are droppable.
        let _ = self.events.send(event);
    }

    fn take_injected_failure(state: &mut ProviderState) -> Option<GeofencingError> {
        state.fail_next.take()
    }
}

#[async_trait::async_trait]
impl GeofencingProvider for InMemoryGeofencingProvider {
    async fn register(&self, request: GeofencingRequest) -> Result<(), GeofencingError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().expect("provider lock");

        if let Some(err) = Self::take_injected_failure(&mut state) {
            return Err(err);
        }

        let new_ids = request
            .geofences
            .iter()
            .filter(|g| !state.regions.contains_key(&g.request_id))
            .count();
        if state.regions.len() + new_ids > self.max_geofences {
            return Err(GeofencingError::TooManyGeofences);
        }

        let position = state.last_position;
        let mut initial_enter: Vec<String> = Vec::new();
        for fence in request.geofences {
            let mut inside = false;
            if let Some((lat, lon)) = position {
                let here = Point::new(lon, lat);
                let center = Point::new(fence.longitude, fence.latitude);
                inside = here.haversine_distance(&center) <= fence.radius_meters as f64;
            }
            if inside
                && request.initial_trigger & INITIAL_TRIGGER_ENTER != 0
                && fence.transition_flags & TRANSITION_ENTER != 0
            {
                initial_enter.push(fence.request_id.clone());
            }
            state.regions.insert(
                fence.request_id.clone(),
                MonitoredRegion {
                    fence,
                    inside,
                    entered_at: if inside { Some(Instant::now()) } else { None },
                    dwell_fired: false,
                },
            );
        }
        let position = state.last_position;
        drop(state);

        if let Some((lat, lon)) = position {
            self.emit(TRANSITION_ENTER, initial_enter, lat, lon);
        }
        Ok(())
    }

    async fn unregister(&self, ids: &[String]) -> Result<(), GeofencingError> {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().expect("provider lock");

        if let Some(err) = Self::take_injected_failure(&mut state) {
            return Err(err);
        }

        for id in ids {
            state.regions.remove(id);
        }
        Ok(())
    }

    async fn unregister_all(&self) -> Result<(), GeofencingError> {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().expect("provider lock");

        if let Some(err) = Self::take_injected_failure(&mut state) {
            return Err(err);
        }

        state.regions.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fence(id: &str, lat: f64, lon: f64, radius: f32, flags: i32) -> NativeGeofence {
        NativeGeofence {
            request_id: id.to_string(),
            latitude: lat,
            longitude: lon,
            radius_meters: radius,
            transition_flags: flags,
            loitering_delay: None,
        }
    }

    fn request(geofences: Vec<NativeGeofence>) -> GeofencingRequest {
        GeofencingRequest {
            initial_trigger: INITIAL_TRIGGER_ENTER | INITIAL_TRIGGER_DWELL,
            geofences,
        }
    }

    #[test]
    fn test_kind_from_code() {
        assert_eq!(kind_from_code(1), Some(TransitionKind::Enter));
        assert_eq!(kind_from_code(2), Some(TransitionKind::Exit));
        assert_eq!(kind_from_code(4), Some(TransitionKind::Dwell));
        assert_eq!(kind_from_code(0), None);
        assert_eq!(kind_from_code(8), None);
    }

    #[test]
    fn test_transition_flags() {
        assert_eq!(transition_flags(&[TransitionKind::Enter]), TRANSITION_ENTER);
        assert_eq!(
            transition_flags(&[
                TransitionKind::Enter,
                TransitionKind::Exit,
                TransitionKind::Dwell
            ]),
            TRANSITION_ENTER | TRANSITION_EXIT | TRANSITION_DWELL
        );
        assert_eq!(transition_flags(&[]), 0);
    }

    #[test]
    fn test_status_code_string() {
        assert_eq!(status_code_string(1000), "GEOFENCE_NOT_AVAILABLE");
        assert_eq!(status_code_string(1001), "GEOFENCE_TOO_MANY_GEOFENCES");
        assert_eq!(
            status_code_string(1002),
            "GEOFENCE_TOO_MANY_PENDING_INTENTS"
        );
        assert_eq!(status_code_string(42), "UNKNOWN_GEOFENCE_STATUS");
    }

    #[test]
    fn test_raw_event_decoding() {
        let json = r#"{"transition": 1, "triggeringIds": ["geo-1"]}"#;
        let event: RawGeofencingEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.transition, TRANSITION_ENTER);
        assert_eq!(event.triggering_ids, vec!["geo-1".to_string()]);
        assert!(event.error_code.is_none());
    }

    #[tokio::test]
    async fn test_register_overwrites_by_id() {
        let (provider, _rx) = InMemoryGeofencingProvider::new();
        provider
            .register(request(vec![fence("geo-1", 48.0, 16.0, 100.0, TRANSITION_ENTER)]))
            .await
            .unwrap();
        provider
            .register(request(vec![fence("geo-1", 48.0, 16.0, 200.0, TRANSITION_ENTER)]))
            .await
            .unwrap();

        assert_eq!(provider.registered_ids(), vec!["geo-1".to_string()]);
        assert_eq!(provider.register_call_count(), 2);
    }

    #[tokio::test]
    async fn test_unregister_removes_and_ignores_unknown() {
        let (provider, _rx) = InMemoryGeofencingProvider::new();
        provider
            .register(request(vec![
                fence("geo-1", 48.0, 16.0, 100.0, TRANSITION_ENTER),
                fence("geo-2", 49.0, 17.0, 100.0, TRANSITION_ENTER),
            ]))
            .await
            .unwrap();

        provider
            .unregister(&["geo-1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(provider.registered_ids(), vec!["geo-2".to_string()]);

        provider.unregister_all().await.unwrap();
        assert!(provider.registered_ids().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_is_returned_once() {
        let (provider, _rx) = InMemoryGeofencingProvider::new();
        provider.fail_next_with(GeofencingError::TooManyGeofences);

        let err = provider
            .register(request(vec![fence("geo-1", 48.0, 16.0, 100.0, TRANSITION_ENTER)]))
            .await
            .unwrap_err();
        assert_eq!(err, GeofencingError::TooManyGeofences);

        // The failure was consumed; the next call succeeds.
        provider
            .register(request(vec![fence("geo-1", 48.0, 16.0, 100.0, TRANSITION_ENTER)]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_enter_and_exit_transitions() {
        let (provider, mut rx) = InMemoryGeofencingProvider::new();
        provider
            .register(request(vec![fence(
                "home",
                48.2082,
                16.3738,
                150.0,
                TRANSITION_ENTER | TRANSITION_EXIT,
            )]))
            .await
            .unwrap();

        // Far away, then inside, then far away again.
        provider.update_position(48.3, 16.5);
        provider.update_position(48.2082, 16.3738);
        provider.update_position(48.3, 16.5);

        let enter = rx.recv().await.unwrap();
        assert_eq!(enter.transition, TRANSITION_ENTER);
        assert_eq!(enter.triggering_ids, vec!["home".to_string()]);

        let exit = rx.recv().await.unwrap();
        assert_eq!(exit.transition, TRANSITION_EXIT);
        assert_eq!(exit.triggering_ids, vec!["home".to_string()]);
    }

    #[tokio::test]
    async fn test_dwell_after_loitering_delay() {
        let (provider, mut rx) = InMemoryGeofencingProvider::new();
        let mut dwell_fence = fence(
            "school",
            48.2082,
            16.3738,
            150.0,
            TRANSITION_ENTER | TRANSITION_DWELL,
        );
        dwell_fence.loitering_delay = Some(Duration::from_millis(20));
        provider.register(request(vec![dwell_fence])).await.unwrap();

        provider.update_position(48.2082, 16.3738);
        let enter = rx.recv().await.unwrap();
        assert_eq!(enter.transition, TRANSITION_ENTER);

        // Still inside before the delay: no dwell yet.
        provider.update_position(48.2082, 16.3738);
        tokio::time::sleep(Duration::from_millis(30)).await;
        provider.update_position(48.2082, 16.3738);

        let dwell = rx.recv().await.unwrap();
        assert_eq!(dwell.transition, TRANSITION_DWELL);
        assert_eq!(dwell.triggering_ids, vec!["school".to_string()]);
    }

    #[tokio::test]
    async fn test_initial_trigger_fires_when_already_inside() {
        let (provider, mut rx) = InMemoryGeofencingProvider::new();
        provider.update_position(48.2082, 16.3738);

        provider
            .register(request(vec![fence(
                "home",
                48.2082,
                16.3738,
                150.0,
                TRANSITION_ENTER,
            )]))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.transition, TRANSITION_ENTER);
        assert_eq!(event.triggering_ids, vec!["home".to_string()]);
    }

    #[tokio::test]
    async fn test_quota_exhaustion() {
        let (provider, _rx) = InMemoryGeofencingProvider::new();
        let fences: Vec<NativeGeofence> = (0..=DEFAULT_MAX_GEOFENCES)
            .map(|i| fence(&format!("geo-{}", i), 48.0, 16.0, 100.0, TRANSITION_ENTER))
            .collect();

        let err = provider.register(request(fences)).await.unwrap_err();
        assert_eq!(err, GeofencingError::TooManyGeofences);
    }
}
