//! Deterministic id derivation for notifications.

use sha2::{Digest, Sha256};

/// Derives a stable notification id from a geofence identifier.
///
/// The id is the big-endian u32 taken from the first four bytes of the
/// SHA-256 digest. Posting with the same id replaces the previous
/// notification for that geofence; distinct geofences get distinct ids and
/// their notifications coexist.
pub fn notification_id(geofence_id: &str) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(geofence_id.as_bytes());
    let digest = hasher.finalize();
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
