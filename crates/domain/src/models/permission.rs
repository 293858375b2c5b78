//! Group actions and the role/permission table.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::group::MemberRole;

/// An action a user may attempt on a group.
///
/// Discriminants are the stable action ids used by the internal
/// check-permission endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum GroupAction {
    Create = 0,
    Edit = 1,
    Remove = 2,
    Get = 3,
    Invite = 4,
    EditRole = 5,
    Expel = 6,
}

impl GroupAction {
    pub const ALL: [GroupAction; 7] = [
        GroupAction::Create,
        GroupAction::Edit,
        GroupAction::Remove,
        GroupAction::Get,
        GroupAction::Invite,
        GroupAction::EditRole,
        GroupAction::Expel,
    ];

    pub fn id(self) -> i16 {
        self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(GroupAction::Create),
            1 => Some(GroupAction::Edit),
            2 => Some(GroupAction::Remove),
            3 => Some(GroupAction::Get),
            4 => Some(GroupAction::Invite),
            5 => Some(GroupAction::EditRole),
            6 => Some(GroupAction::Expel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupAction::Create => "create",
            GroupAction::Edit => "edit",
            GroupAction::Remove => "remove",
            GroupAction::Get => "get",
            GroupAction::Invite => "invite",
            GroupAction::EditRole => "edit_role",
            GroupAction::Expel => "expel",
        }
    }
}

impl TryFrom<i16> for GroupAction {
    type Error = String;

    fn try_from(id: i16) -> Result<Self, Self::Error> {
        GroupAction::from_id(id).ok_or_else(|| format!("Invalid action id: {}", id))
    }
}

impl From<GroupAction> for i16 {
    fn from(action: GroupAction) -> Self {
        action.id()
    }
}

impl fmt::Display for GroupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MemberRole {
    /// Whether a member holding this role may perform `action`.
    ///
    /// `Create` is decided by group ownership rather than role, so no
    /// existing role grants it.
    pub fn allows(self, action: GroupAction) -> bool {
        match (self, action) {
            (MemberRole::Creator | MemberRole::Admin | MemberRole::Dweller, GroupAction::Create) => {
                false
            }
            (MemberRole::Creator | MemberRole::Admin | MemberRole::Dweller, GroupAction::Get) => {
                true
            }
            (
                MemberRole::Creator | MemberRole::Admin,
                GroupAction::Edit
                | GroupAction::Remove
                | GroupAction::Invite
                | GroupAction::EditRole
                | GroupAction::Expel,
            ) => true,
            (
                MemberRole::Dweller,
                GroupAction::Edit
                | GroupAction::Remove
                | GroupAction::Invite
                | GroupAction::EditRole
                | GroupAction::Expel,
            ) => false,
        }
    }
}

/// Query for the internal check-permission endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckPermissionQuery {
    pub user_id: i64,
    pub group_id: i64,
    pub action_id: i16,
}

/// Query identifying a user's membership in one group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserGroupQuery {
    pub user_id: i64,
    pub group_id: i64,
}

/// Query for listing a user's groups from another service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InternalListGroupsQuery {
    pub user_id: i64,
    pub group_id: Option<i64>,
}

/// Result of a permission check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckPermissionResponse {
    pub user_id: i64,
    pub group_id: i64,
    pub action_id: GroupAction,
    pub allowed: bool,
}
