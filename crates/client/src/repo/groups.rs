//! Group repository contract and in-memory implementation.

use std::sync::Mutex;

use uuid::Uuid;

use domain::models::GroupMembership;

use super::RepositoryError;

/// Group administration contract against the remote service.
#[async_trait::async_trait]
pub trait GroupRepository: Send + Sync {
    async fn get_group_members(
        &self,
        group_id: &str,
    ) -> Result<Vec<GroupMembership>, RepositoryError>;

    async fn remove_member(&self, group_id: &str, user_id: Uuid) -> Result<(), RepositoryError>;

    async fn leave_group(&self, group_id: &str) -> Result<(), RepositoryError>;
}

/// In-memory group repository for tests.
#[derive(Default)]
pub struct InMemoryGroupRepository {
    members: Mutex<Vec<(String, GroupMembership)>>,
    left_groups: Mutex<Vec<String>>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_member(&self, group_id: &str, member: GroupMembership) {
        self.members
            .lock()
            .expect("repo lock")
            .push((group_id.to_string(), member));
    }

    pub fn left_groups(&self) -> Vec<String> {
        self.left_groups.lock().expect("repo lock").clone()
    }
}

#[async_trait::async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn get_group_members(
        &self,
        group_id: &str,
    ) -> Result<Vec<GroupMembership>, RepositoryError> {
        Ok(self
            .members
            .lock()
            .expect("repo lock")
            .iter()
            .filter(|(g, _)| g == group_id)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn remove_member(&self, group_id: &str, user_id: Uuid) -> Result<(), RepositoryError> {
        let mut members = self.members.lock().expect("repo lock");
        let before = members.len();
        members.retain(|(g, m)| !(g == group_id && m.user_id == user_id));
        if members.len() == before {
            return Err(RepositoryError::NotFound(format!("member {}", user_id)));
        }
        Ok(())
    }

    async fn leave_group(&self, group_id: &str) -> Result<(), RepositoryError> {
        self.left_groups
            .lock()
            .expect("repo lock")
            .push(group_id.to_string());
        Ok(())
    }
}
