//! Group domain models for location sharing groups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Owner,
    Admin,
    Member,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Owner => "owner",
            GroupRole::Admin => "admin",
            GroupRole::Member => "member",
        }
    }

    /// Returns true if this role can manage members (invite, remove).
    pub fn can_manage_members(&self) -> bool {
        matches!(self, GroupRole::Owner | GroupRole::Admin)
    }

    /// Returns true if this role can delete the group.
    pub fn can_delete_group(&self) -> bool {
        matches!(self, GroupRole::Owner)
    }

    /// Returns true if a member with this role can leave the group.
    /// Owners must transfer ownership first.
    pub fn can_leave(&self) -> bool {
        !matches!(self, GroupRole::Owner)
    }

    /// Returns true if this role can remove a member holding `other`.
    /// Admins remove plain members; owners remove anyone but themselves.
    pub fn can_remove(&self, other: GroupRole) -> bool {
        match self {
            GroupRole::Owner => !matches!(other, GroupRole::Owner),
            GroupRole::Admin => matches!(other, GroupRole::Member),
            GroupRole::Member => false,
        }
    }
}

impl FromStr for GroupRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(GroupRole::Owner),
            "admin" => Ok(GroupRole::Admin),
            "member" => Ok(GroupRole::Member),
            other => Err(format!("Unknown group role: {}", other)),
        }
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A location sharing group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: String,
    pub name: String,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}

/// A user's membership in a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

/// Response for listing group members.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGroupMembersResponse {
    pub members: Vec<GroupMembership>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_role_serialization() {
        assert_eq!(serde_json::to_string(&GroupRole::Owner).unwrap(), "\"owner\"");
        assert_eq!(serde_json::to_string(&GroupRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::to_string(&GroupRole::Member).unwrap(),
            "\"member\""
        );
    }

    #[test]
    fn test_group_role_from_str() {
        assert_eq!("owner".parse::<GroupRole>().unwrap(), GroupRole::Owner);
        assert_eq!("admin".parse::<GroupRole>().unwrap(), GroupRole::Admin);
        assert_eq!("member".parse::<GroupRole>().unwrap(), GroupRole::Member);
        assert!("viewer".parse::<GroupRole>().is_err());
    }

    #[test]
    fn test_role_member_management() {
        assert!(GroupRole::Owner.can_manage_members());
        assert!(GroupRole::Admin.can_manage_members());
        assert!(!GroupRole::Member.can_manage_members());
    }

    #[test]
    fn test_role_delete_group() {
        assert!(GroupRole::Owner.can_delete_group());
        assert!(!GroupRole::Admin.can_delete_group());
        assert!(!GroupRole::Member.can_delete_group());
    }

    #[test]
    fn test_role_leave() {
        assert!(!GroupRole::Owner.can_leave());
        assert!(GroupRole::Admin.can_leave());
        assert!(GroupRole::Member.can_leave());
    }

    #[test]
    fn test_role_remove_matrix() {
        assert!(GroupRole::Owner.can_remove(GroupRole::Admin));
        assert!(GroupRole::Owner.can_remove(GroupRole::Member));
        assert!(!GroupRole::Owner.can_remove(GroupRole::Owner));

        assert!(GroupRole::Admin.can_remove(GroupRole::Member));
        assert!(!GroupRole::Admin.can_remove(GroupRole::Admin));
        assert!(!GroupRole::Admin.can_remove(GroupRole::Owner));

        assert!(!GroupRole::Member.can_remove(GroupRole::Member));
    }

    #[test]
    fn test_group_membership_deserialization() {
        let json = r#"{
            "userId": "550e8400-e29b-41d4-a716-446655440000",
            "displayName": "Anna",
            "role": "admin",
            "joinedAt": "2025-05-10T08:30:00Z"
        }"#;

        let member: GroupMembership = serde_json::from_str(json).unwrap();
        assert_eq!(member.display_name, "Anna");
        assert_eq!(member.role, GroupRole::Admin);
    }
}
