//! Geofence domain model.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use shared::validation::{MAX_GEOFENCE_RADIUS_METERS, MIN_GEOFENCE_RADIUS_METERS};

/// Transition kinds a geofence can be monitored for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Enter,
    Exit,
    Dwell,
}

impl TransitionKind {
    /// Converts to wire string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Enter => "enter",
            TransitionKind::Exit => "exit",
            TransitionKind::Dwell => "dwell",
        }
    }

    /// Parses from wire string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "enter" => Some(TransitionKind::Enter),
            "exit" => Some(TransitionKind::Exit),
            "dwell" => Some(TransitionKind::Dwell),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised when constructing a geofence with invalid attributes.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeofenceError {
    #[error("Name must be 1-100 characters")]
    InvalidName,

    #[error("Latitude {0} is out of range (-90 to 90)")]
    InvalidLatitude(f64),

    #[error("Longitude {0} is out of range (-180 to 180)")]
    InvalidLongitude(f64),

    #[error("Radius {0} is out of range (50 to 10000 meters)")]
    InvalidRadius(f32),

    #[error("At least one transition kind must be monitored")]
    NoTransitions,
}

/// A named circular region monitored for entry, exit, and dwell.
///
/// The remote service is the source of truth; the on-device platform
/// registration is a derived, eventually-consistent mirror keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f32,
    pub transitions: Vec<TransitionKind>,
    pub active: bool,
}

impl Geofence {
    /// Builds a geofence, enforcing the construction-time contract:
    /// radius within [50, 10000], coordinates within WGS84 bounds, and a
    /// non-empty transition set.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        radius_meters: f32,
        transitions: Vec<TransitionKind>,
    ) -> Result<Self, GeofenceError> {
        let name = name.into();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(GeofenceError::InvalidName);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeofenceError::InvalidLatitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeofenceError::InvalidLongitude(longitude));
        }
        if !(MIN_GEOFENCE_RADIUS_METERS..=MAX_GEOFENCE_RADIUS_METERS).contains(&radius_meters) {
            return Err(GeofenceError::InvalidRadius(radius_meters));
        }
        if transitions.is_empty() {
            return Err(GeofenceError::NoTransitions);
        }

        Ok(Self {
            id: id.into(),
            name,
            latitude,
            longitude,
            radius_meters,
            transitions,
            active: true,
        })
    }

    /// True if this geofence is monitored for the given transition kind.
    pub fn monitors(&self, kind: TransitionKind) -> bool {
        self.transitions.contains(&kind)
    }
}

/// Default transition kinds for new geofences.
fn default_transitions() -> Vec<TransitionKind> {
    vec![TransitionKind::Enter, TransitionKind::Exit]
}

/// Default active status for new geofences.
fn default_active() -> bool {
    true
}

/// Request payload for creating a geofence on the remote service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGeofenceRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_radius"))]
    pub radius_meters: f32,

    #[serde(default = "default_transitions")]
    pub transitions: Vec<TransitionKind>,

    #[serde(default = "default_active")]
    pub active: bool,
}

/// Response for listing geofences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGeofencesResponse {
    pub geofences: Vec<Geofence>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transitions_all() -> Vec<TransitionKind> {
        vec![
            TransitionKind::Enter,
            TransitionKind::Exit,
            TransitionKind::Dwell,
        ]
    }

    #[test]
    fn test_transition_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&TransitionKind::Enter).unwrap(),
            "\"enter\""
        );
        assert_eq!(
            serde_json::to_string(&TransitionKind::Exit).unwrap(),
            "\"exit\""
        );
        assert_eq!(
            serde_json::to_string(&TransitionKind::Dwell).unwrap(),
            "\"dwell\""
        );
    }

    #[test]
    fn test_transition_kind_parse() {
        assert_eq!(TransitionKind::parse("enter"), Some(TransitionKind::Enter));
        assert_eq!(TransitionKind::parse("exit"), Some(TransitionKind::Exit));
        assert_eq!(TransitionKind::parse("dwell"), Some(TransitionKind::Dwell));
        assert_eq!(TransitionKind::parse("invalid"), None);
    }

    #[test]
    fn test_geofence_new_valid() {
        let fence = Geofence::new("geo-1", "Home", 37.7749, -122.4194, 100.0, transitions_all())
            .expect("valid geofence");
        assert_eq!(fence.id, "geo-1");
        assert_eq!(fence.name, "Home");
        assert!(fence.active);
        assert!(fence.monitors(TransitionKind::Dwell));
    }

    #[test]
    fn test_geofence_new_rejects_zero_radius() {
        let result = Geofence::new("geo-1", "Home", 37.0, -122.0, 0.0, transitions_all());
        assert_eq!(result.unwrap_err(), GeofenceError::InvalidRadius(0.0));
    }

    #[test]
    fn test_geofence_new_rejects_radius_out_of_range() {
        assert!(Geofence::new("g", "Home", 37.0, -122.0, 49.9, transitions_all()).is_err());
        assert!(Geofence::new("g", "Home", 37.0, -122.0, 10_000.1, transitions_all()).is_err());
        assert!(Geofence::new("g", "Home", 37.0, -122.0, 10_000.0, transitions_all()).is_ok());
    }

    #[test]
    fn test_geofence_new_rejects_bad_coordinates() {
        assert_eq!(
            Geofence::new("g", "Home", 90.1, 0.0, 100.0, transitions_all()).unwrap_err(),
            GeofenceError::InvalidLatitude(90.1)
        );
        assert_eq!(
            Geofence::new("g", "Home", 0.0, -180.5, 100.0, transitions_all()).unwrap_err(),
            GeofenceError::InvalidLongitude(-180.5)
        );
    }

    #[test]
    fn test_geofence_new_rejects_empty_transitions() {
        let result = Geofence::new("g", "Home", 37.0, -122.0, 100.0, vec![]);
        assert_eq!(result.unwrap_err(), GeofenceError::NoTransitions);
    }

    #[test]
    fn test_geofence_new_rejects_empty_name() {
        let result = Geofence::new("g", "", 37.0, -122.0, 100.0, transitions_all());
        assert_eq!(result.unwrap_err(), GeofenceError::InvalidName);
    }

    #[test]
    fn test_create_geofence_request_defaults() {
        let json = r#"{
            "name": "Home",
            "latitude": 37.7749,
            "longitude": -122.4194,
            "radiusMeters": 100.0
        }"#;

        let request: CreateGeofenceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "Home");
        assert_eq!(request.transitions.len(), 2);
        assert!(request.active);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_geofence_request_validation_rejects_bad_radius() {
        let json = r#"{
            "name": "Home",
            "latitude": 37.7749,
            "longitude": -122.4194,
            "radiusMeters": 5.0
        }"#;

        let request: CreateGeofenceRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_geofence_wire_roundtrip() {
        let fence =
            Geofence::new("geo-7", "Office", 40.7128, -74.006, 250.0, transitions_all()).unwrap();
        let json = serde_json::to_string(&fence).unwrap();
        assert!(json.contains("\"radiusMeters\":250"));
        let back: Geofence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fence);
    }
}
