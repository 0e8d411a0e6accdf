//! Shared utilities and common types for the Phone Manager client.
//!
//! This crate provides common functionality used across all other crates:
//! - Common validation logic (coordinates, radii, invite codes)
//! - Deterministic notification-id derivation

pub mod ids;
pub mod validation;
