//! Invite domain models for group invitations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::group::GroupRole;

/// A group invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupInvite {
    pub id: Uuid,
    pub group_id: String,
    pub code: String,
    pub preset_role: GroupRole,
    pub max_uses: i32,
    pub current_uses: i32,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl GroupInvite {
    /// True once every allowed use has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.current_uses >= self.max_uses
    }

    /// True if the invite can still be redeemed at `now`.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_exhausted() && now < self.expires_at
    }
}

/// Request to create a new invite.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInviteRequest {
    /// Role to assign when joining (default: member). Cannot be owner.
    pub preset_role: Option<GroupRole>,

    /// Maximum uses (1-100, default: 1)
    #[validate(range(min = 1, max = 100, message = "max_uses must be between 1 and 100"))]
    pub max_uses: Option<i32>,

    /// Hours until expiry (1-168, default: 24)
    #[validate(range(
        min = 1,
        max = 168,
        message = "expires_in_hours must be between 1 and 168"
    ))]
    pub expires_in_hours: Option<i32>,
}

/// Request to redeem an invite code.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RedeemInviteRequest {
    #[validate(custom(function = "shared::validation::validate_invite_code"))]
    pub code: String,
}

/// Response after redeeming an invite.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RedeemInviteResponse {
    pub group_id: String,
    pub role: GroupRole,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_invite(max_uses: i32, current_uses: i32, active: bool) -> GroupInvite {
        GroupInvite {
            id: Uuid::nil(),
            group_id: "family".to_string(),
            code: "ABCD1234".to_string(),
            preset_role: GroupRole::Member,
            max_uses,
            current_uses,
            expires_at: Utc::now() + Duration::hours(24),
            is_active: active,
        }
    }

    #[test]
    fn test_invite_exhaustion() {
        assert!(!sample_invite(2, 1, true).is_exhausted());
        assert!(sample_invite(2, 2, true).is_exhausted());
    }

    #[test]
    fn test_invite_redeemable() {
        let now = Utc::now();
        assert!(sample_invite(1, 0, true).is_redeemable(now));
        assert!(!sample_invite(1, 1, true).is_redeemable(now));
        assert!(!sample_invite(1, 0, false).is_redeemable(now));
    }

    #[test]
    fn test_invite_expired_not_redeemable() {
        let mut invite = sample_invite(1, 0, true);
        invite.expires_at = Utc::now() - Duration::hours(1);
        assert!(!invite.is_redeemable(Utc::now()));
    }

    #[test]
    fn test_create_invite_request_validation() {
        let ok = CreateInviteRequest {
            preset_role: Some(GroupRole::Member),
            max_uses: Some(10),
            expires_in_hours: Some(48),
        };
        assert!(ok.validate().is_ok());

        let bad = CreateInviteRequest {
            preset_role: None,
            max_uses: Some(0),
            expires_in_hours: Some(200),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_redeem_invite_request_validates_code_format() {
        let ok = RedeemInviteRequest {
            code: "ABCD1234".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RedeemInviteRequest {
            code: "nope".to_string(),
        };
        assert!(bad.validate().is_err());
    }
}
