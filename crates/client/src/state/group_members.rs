//! State model for the group member roster.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use uuid::Uuid;

use domain::models::{GroupMembership, GroupRole};

use crate::repo::GroupRepository;

/// Snapshot of the group members screen.
#[derive(Debug, Clone, Default)]
pub struct GroupMembersState {
    pub members: Vec<GroupMembership>,
    /// The viewing user's own role, once loaded.
    pub current_role: Option<GroupRole>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// State model for group member administration.
pub struct GroupMembersModel {
    repo: Arc<dyn GroupRepository>,
    group_id: String,
    current_user_id: Uuid,
    state_tx: watch::Sender<GroupMembersState>,
}

impl GroupMembersModel {
    pub fn new(
        repo: Arc<dyn GroupRepository>,
        group_id: impl Into<String>,
        current_user_id: Uuid,
    ) -> Self {
        let (state_tx, _) = watch::channel(GroupMembersState::default());
        Self {
            repo,
            group_id: group_id.into(),
            current_user_id,
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GroupMembersState> {
        self.state_tx.subscribe()
    }

    /// Loads the roster and resolves the viewing user's role.
    pub async fn load(&self) {
        self.state_tx.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        match self.repo.get_group_members(&self.group_id).await {
            Ok(members) => {
                let current_role = members
                    .iter()
                    .find(|m| m.user_id == self.current_user_id)
                    .map(|m| m.role);
                self.state_tx.send_modify(|state| {
                    state.is_loading = false;
                    state.members = members;
                    state.current_role = current_role;
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to load group members");
                self.state_tx.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    /// True if the viewing user may remove the given member.
    pub fn can_remove(&self, target: &GroupMembership) -> bool {
        if target.user_id == self.current_user_id {
            return false;
        }
        self.state_tx
            .borrow()
            .current_role
            .map(|role| role.can_remove(target.role))
            .unwrap_or(false)
    }

    /// True if the viewing user may leave the group.
    pub fn can_leave(&self) -> bool {
        self.state_tx
            .borrow()
            .current_role
            .map(|role| role.can_leave())
            .unwrap_or(false)
    }

    /// Removes a member after a local permission check.
    pub async fn remove_member(&self, user_id: Uuid) {
        let target = self
            .state_tx
            .borrow()
            .members
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned();

        let Some(target) = target else {
            self.state_tx.send_modify(|state| {
                state.error = Some("Member not found".to_string());
            });
            return;
        };

        if !self.can_remove(&target) {
            self.state_tx.send_modify(|state| {
                state.error = Some("You cannot remove this member".to_string());
            });
            return;
        }

        match self.repo.remove_member(&self.group_id, user_id).await {
            Ok(()) => {
                info!(user_id = %user_id, "Removed group member");
                self.state_tx.send_modify(|state| {
                    state.members.retain(|m| m.user_id != user_id);
                    state.error = None;
                });
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to remove member");
                self.state_tx.send_modify(|state| {
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    /// Leaves the group, unless the viewing user is the owner.
    pub async fn leave(&self) {
        if !self.can_leave() {
            self.state_tx.send_modify(|state| {
                state.error = Some("Transfer ownership before leaving the group".to_string());
            });
            return;
        }

        match self.repo.leave_group(&self.group_id).await {
            Ok(()) => {
                info!(group_id = %self.group_id, "Left group");
                self.state_tx.send_modify(|state| {
                    state.error = None;
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to leave group");
                self.state_tx.send_modify(|state| {
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    pub fn clear_error(&self) {
        self.state_tx.send_modify(|state| {
            state.error = None;
        });
    }
}
