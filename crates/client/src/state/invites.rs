//! State model for invite flows: create an invite, redeem a code.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};
use validator::Validate;

use domain::models::invite::{RedeemInviteRequest, RedeemInviteResponse};
use domain::models::{CreateInviteRequest, GroupInvite};

use crate::repo::InviteRepository;

use super::validation_message;

/// Snapshot of the invite screens.
#[derive(Debug, Clone, Default)]
pub struct InvitesState {
    /// The most recently created invite, for display/sharing.
    pub created: Option<GroupInvite>,
    pub is_working: bool,
    /// Set after a successful redemption.
    pub redeemed: Option<RedeemInviteResponse>,
    pub error: Option<String>,
}

/// State model for creating and redeeming invites.
pub struct InvitesModel {
    repo: Arc<dyn InviteRepository>,
    group_id: String,
    state_tx: watch::Sender<InvitesState>,
}

impl InvitesModel {
    pub fn new(repo: Arc<dyn InviteRepository>, group_id: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(InvitesState::default());
        Self {
            repo,
            group_id: group_id.into(),
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<InvitesState> {
        self.state_tx.subscribe()
    }

    /// Creates an invite for the model's group.
    pub async fn create_invite(&self, request: CreateInviteRequest) {
        if let Err(errors) = request.validate() {
            self.state_tx.send_modify(|state| {
                state.error = Some(validation_message(&errors));
            });
            return;
        }

        self.state_tx.send_modify(|state| {
            state.is_working = true;
            state.error = None;
        });

        match self.repo.create_invite(&self.group_id, request).await {
            Ok(invite) => {
                info!(code = %invite.code, "Created invite");
                self.state_tx.send_modify(|state| {
                    state.is_working = false;
                    state.created = Some(invite);
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to create invite");
                self.state_tx.send_modify(|state| {
                    state.is_working = false;
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    /// Redeems an invite code. The code format is validated locally before
    /// the API call.
    pub async fn redeem(&self, code: &str) {
        let request = RedeemInviteRequest {
            code: code.to_string(),
        };
        if let Err(errors) = request.validate() {
            self.state_tx.send_modify(|state| {
                state.error = Some(validation_message(&errors));
            });
            return;
        }

        self.state_tx.send_modify(|state| {
            state.is_working = true;
            state.error = None;
        });

        match self.repo.redeem_invite(&request.code).await {
            Ok(response) => {
                info!(group_id = %response.group_id, "Redeemed invite");
                self.state_tx.send_modify(|state| {
                    state.is_working = false;
                    state.redeemed = Some(response);
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to redeem invite");
                self.state_tx.send_modify(|state| {
                    state.is_working = false;
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
