//! Membership domain models and request/response DTOs.

use serde::{Deserialize, Serialize};

use super::group::MemberRole;

/// A (user, role) pair stored for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub group_id: i64,
    pub user_id: i64,
    pub role: MemberRole,
}

/// Member view enriched with account profile fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MembershipView {
    pub user_id: i64,
    pub group_id: i64,
    pub role_id: MemberRole,
    pub role_name: String,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub avatar_url: String,
}

/// Response for listing members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListMembersResponse {
    pub data: Vec<MembershipView>,
}

fn default_invite_role() -> MemberRole {
    MemberRole::Dweller
}

/// Request to add users to a group, by id and/or by email.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteUserRequest {
    #[serde(default)]
    pub user_ids: Vec<i64>,
    #[serde(default)]
    pub user_emails: Vec<String>,
    #[serde(default = "default_invite_role")]
    pub role: MemberRole,
}

/// Result of an invite: the ids that were actually added.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteUserResponse {
    pub group_id: i64,
    pub role: MemberRole,
    pub user_ids: Vec<i64>,
}

/// Target member, identified by id or, when the id is absent, by email.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MemberTarget {
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
}

/// Request to change a member's role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChangeRoleRequest {
    pub group_id: i64,
    #[serde(flatten)]
    pub target: MemberTarget,
    pub role: MemberRole,
}

/// Response after changing a role.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ChangeRoleResponse {
    pub group_id: i64,
    pub user_id: i64,
    pub role: MemberRole,
}

/// Request to remove a member from a group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExpelUserRequest {
    pub group_id: i64,
    #[serde(flatten)]
    pub target: MemberTarget,
}

/// Response after removing a member.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ExpelUserResponse {
    pub group_id: i64,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}
