//! Invite repository contract and in-memory implementation.

use std::sync::Mutex;

use chrono::{Duration, Utc};
use uuid::Uuid;

use domain::models::invite::RedeemInviteResponse;
use domain::models::{CreateInviteRequest, GroupInvite, GroupRole};

use super::RepositoryError;

/// Invite contract against the remote service.
#[async_trait::async_trait]
pub trait InviteRepository: Send + Sync {
    async fn create_invite(
        &self,
        group_id: &str,
        request: CreateInviteRequest,
    ) -> Result<GroupInvite, RepositoryError>;

    async fn redeem_invite(&self, code: &str) -> Result<RedeemInviteResponse, RepositoryError>;
}

/// In-memory invite repository for tests.
#[derive(Default)]
pub struct InMemoryInviteRepository {
    invites: Mutex<Vec<GroupInvite>>,
}

impl InMemoryInviteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invites(&self) -> Vec<GroupInvite> {
        self.invites.lock().expect("repo lock").clone()
    }
}

#[async_trait::async_trait]
impl InviteRepository for InMemoryInviteRepository {
    async fn create_invite(
        &self,
        group_id: &str,
        request: CreateInviteRequest,
    ) -> Result<GroupInvite, RepositoryError> {
        let invite = GroupInvite {
            id: Uuid::new_v4(),
            group_id: group_id.to_string(),
            code: "ABCD1234".to_string(),
            preset_role: request.preset_role.unwrap_or(GroupRole::Member),
            max_uses: request.max_uses.unwrap_or(1),
            current_uses: 0,
            expires_at: Utc::now() + Duration::hours(request.expires_in_hours.unwrap_or(24) as i64),
            is_active: true,
        };
        self.invites.lock().expect("repo lock").push(invite.clone());
        Ok(invite)
    }

    async fn redeem_invite(&self, code: &str) -> Result<RedeemInviteResponse, RepositoryError> {
        let mut invites = self.invites.lock().expect("repo lock");
        let invite = invites
            .iter_mut()
            .find(|i| i.code == code && i.is_redeemable(Utc::now()))
            .ok_or_else(|| RepositoryError::NotFound(format!("invite {}", code)))?;
        invite.current_uses += 1;
        Ok(RedeemInviteResponse {
            group_id: invite.group_id.clone(),
            role: invite.preset_role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateInviteRequest {
        CreateInviteRequest {
            preset_role: Some(GroupRole::Member),
            max_uses: Some(1),
            expires_in_hours: Some(24),
        }
    }

    #[tokio::test]
    async fn test_create_and_redeem() {
        let repo = InMemoryInviteRepository::new();
        let invite = repo.create_invite("family", request()).await.unwrap();

        let redeemed = repo.redeem_invite(&invite.code).await.unwrap();
        assert_eq!(redeemed.group_id, "family");
        assert_eq!(redeemed.role, GroupRole::Member);
    }

    #[tokio::test]
    async fn test_redeem_exhausted_invite_fails() {
        let repo = InMemoryInviteRepository::new();
        let invite = repo.create_invite("family", request()).await.unwrap();

        repo.redeem_invite(&invite.code).await.unwrap();
        let err = repo.redeem_invite(&invite.code).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_redeem_unknown_code_fails() {
        let repo = InMemoryInviteRepository::new();
        assert!(repo.redeem_invite("ZZZZ9999").await.is_err());
    }
}
