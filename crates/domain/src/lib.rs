//! Domain layer for the Phone Manager client.
//!
//! This crate contains:
//! - Domain models (Geofence, Device, Group, GroupInvite)
//! - Construction-time invariants and permission predicates
//! - Domain error types

pub mod models;
