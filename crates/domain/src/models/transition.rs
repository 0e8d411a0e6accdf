//! Transition event domain model.

use super::geofence::TransitionKind;

/// A validated boundary-crossing occurrence.
///
/// Ephemeral: constructed from a platform callback payload, consumed by the
/// dispatcher, and discarded after notification emission. There is no retry
/// queue; a dropped event is lost permanently.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEvent {
    pub kind: TransitionKind,
    /// Identifiers of the geofences that triggered this event. Non-empty.
    pub geofence_ids: Vec<String>,
    /// Location at the moment of the crossing, when the platform reported it.
    pub location: Option<(f64, f64)>,
}

impl TransitionEvent {
    pub fn new(kind: TransitionKind, geofence_ids: Vec<String>) -> Self {
        Self {
            kind,
            geofence_ids,
            location: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some((latitude, longitude));
        self
    }
}
