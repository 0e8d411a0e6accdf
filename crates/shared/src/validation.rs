//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Minimum geofence radius in meters.
pub const MIN_GEOFENCE_RADIUS_METERS: f32 = 50.0;

/// Maximum geofence radius in meters.
pub const MAX_GEOFENCE_RADIUS_METERS: f32 = 10_000.0;

lazy_static! {
    /// Invite codes are 8 uppercase alphanumeric characters.
    static ref INVITE_CODE_RE: Regex = Regex::new(r"^[A-Z0-9]{8}$").expect("valid regex");
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that a geofence radius is within the monitorable range.
pub fn validate_radius(radius_meters: f32) -> Result<(), ValidationError> {
    if (MIN_GEOFENCE_RADIUS_METERS..=MAX_GEOFENCE_RADIUS_METERS).contains(&radius_meters) {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be between 50 and 10000 meters".into());
        Err(err)
    }
}

/// Validates an invite code's format without hitting the backend.
pub fn validate_invite_code(code: &str) -> Result<(), ValidationError> {
    if INVITE_CODE_RE.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invite_code_format");
        err.message = Some("Invite code must be 8 uppercase letters or digits".into());
        Err(err)
    }
}
