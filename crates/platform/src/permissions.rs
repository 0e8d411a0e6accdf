//! Location authorization state.

/// Read-only view of the location permissions granted to the app.
pub trait PermissionProbe: Send + Sync {
    /// Fine (precise) location authorization.
    fn fine_location_granted(&self) -> bool;

    /// Background location authorization. Platforms without a separate
    /// background grant report true.
    fn background_location_granted(&self) -> bool;
}

/// Fixed permission state, used in tests and the headless agent.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions {
    pub fine_location: bool,
    pub background_location: bool,
}

impl StaticPermissions {
    /// Both permissions granted.
    pub fn granted() -> Self {
        Self {
            fine_location: true,
            background_location: true,
        }
    }

    /// Both permissions denied.
    pub fn denied() -> Self {
        Self {
            fine_location: false,
            background_location: false,
        }
    }
}

impl PermissionProbe for StaticPermissions {
    fn fine_location_granted(&self) -> bool {
        self.fine_location
    }

    fn background_location_granted(&self) -> bool {
        self.background_location
    }
}
