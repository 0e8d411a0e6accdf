//! Group endpoints.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use domain::models::group::ListGroupMembersResponse;
use domain::models::GroupMembership;

use crate::repo::{GroupRepository, RepositoryError};

use super::http::ApiClient;

#[derive(Debug, Clone, Serialize)]
struct Empty {}

/// HTTP-backed group repository.
pub struct HttpGroupRepository {
    client: Arc<ApiClient>,
}

impl HttpGroupRepository {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl GroupRepository for HttpGroupRepository {
    async fn get_group_members(
        &self,
        group_id: &str,
    ) -> Result<Vec<GroupMembership>, RepositoryError> {
        let response: ListGroupMembersResponse = self
            .client
            .get(&format!("/api/v1/groups/{}/members", group_id))
            .await?;
        Ok(response.members)
    }

    async fn remove_member(&self, group_id: &str, user_id: Uuid) -> Result<(), RepositoryError> {
        Ok(self
            .client
            .delete(&format!("/api/v1/groups/{}/members/{}", group_id, user_id))
            .await?)
    }

    async fn leave_group(&self, group_id: &str) -> Result<(), RepositoryError> {
        Ok(self
            .client
            .post_no_content(&format!("/api/v1/groups/{}/leave", group_id), &Empty {})
            .await?)
    }
}
