//! Per-screen state models.
//!
//! Each model pattern-matches repository results into an immutable state
//! record published through a `watch` channel: either a data field or an
//! error message is written, never both. Late subscribers receive the
//! current snapshot.

pub mod geofences;
pub mod group_members;
pub mod invites;
pub mod member_home;

pub use geofences::{GeofencesModel, GeofencesState};
pub use group_members::{GroupMembersModel, GroupMembersState};
pub use invites::{InvitesModel, InvitesState};
pub use member_home::{MemberHomeModel, MemberHomeState};

/// Flattens validator output into a single user-facing message.
pub(crate) fn validation_message(errors: &validator::ValidationErrors) -> String {
    let messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(_, errors)| {
            errors
                .iter()
                .map(|e| e.message.clone().map(|m| m.to_string()).unwrap_or_default())
        })
        .collect();

    if messages.len() == 1 {
        messages[0].clone()
    } else {
        format!("{} validation errors", messages.len())
    }
}
