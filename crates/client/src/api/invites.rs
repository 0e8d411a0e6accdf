//! Invite endpoints.

use std::sync::Arc;

use domain::models::invite::{RedeemInviteRequest, RedeemInviteResponse};
use domain::models::{CreateInviteRequest, GroupInvite};

use crate::repo::{InviteRepository, RepositoryError};

use super::http::ApiClient;

/// HTTP-backed invite repository.
pub struct HttpInviteRepository {
    client: Arc<ApiClient>,
}

impl HttpInviteRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl InviteRepository for HttpInviteRepository {
    async fn create_invite(
        &self,
        group_id: &str,
        request: CreateInviteRequest,
    ) -> Result<GroupInvite, RepositoryError> {
        Ok(self
            .client
            .post(&format!("/api/v1/groups/{}/invites", group_id), &request)
            .await?)
    }

    async fn redeem_invite(&self, code: &str) -> Result<RedeemInviteResponse, RepositoryError> {
        let request = RedeemInviteRequest {
            code: code.to_string(),
        };
        Ok(self.client.post("/api/v1/invites/redeem", &request).await?)
    }
}
