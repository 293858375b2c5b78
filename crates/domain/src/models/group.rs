//! Group domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Role within a group.
///
/// Discriminants are the role ids stored in `users_groups.role_id`.
/// Privilege is ordered Creator > Admin > Dweller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum MemberRole {
    Creator = 1,
    Admin = 2,
    Dweller = 3,
}

impl MemberRole {
    pub fn id(self) -> i16 {
        self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(MemberRole::Creator),
            2 => Some(MemberRole::Admin),
            3 => Some(MemberRole::Dweller),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Creator => "creator",
            MemberRole::Admin => "admin",
            MemberRole::Dweller => "dweller",
        }
    }
}

impl TryFrom<i16> for MemberRole {
    type Error = String;

    fn try_from(id: i16) -> Result<Self, Self::Error> {
        MemberRole::from_id(id).ok_or_else(|| format!("Invalid role id: {}", id))
    }
}

impl From<MemberRole> for i16 {
    fn from(role: MemberRole) -> Self {
        role.id()
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a group. Deleted groups keep their row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum GroupStatus {
    Active = 1,
    Deleted = 2,
}

impl GroupStatus {
    pub fn id(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i16> for GroupStatus {
    type Error = String;

    fn try_from(id: i16) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(GroupStatus::Active),
            2 => Ok(GroupStatus::Deleted),
            _ => Err(format!("Invalid group status: {}", id)),
        }
    }
}

impl From<GroupStatus> for i16 {
    fn from(status: GroupStatus) -> Self {
        status.id()
    }
}

/// A persisted group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub avatar_url: String,
    pub create_by: i64,
    pub create_at: DateTime<Utc>,
    pub status: GroupStatus,
    /// Number of members.
    pub count: i64,
}

impl Group {
    pub fn is_deleted(&self) -> bool {
        self.status == GroupStatus::Deleted
    }
}

/// User-editable group fields, used for both create and update.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct GroupDraft {
    #[validate(
        length(max = 100, message = "Title is too long"),
        custom(function = "shared::validation::validate_not_blank", message = "Title is required")
    )]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "Group description is too long"))]
    pub description: String,

    #[validate(length(
        min = 3,
        max = 20,
        message = "Group link must be between 3 and 20 characters"
    ))]
    pub url: String,

    #[serde(default)]
    pub avatar_url: String,
}

/// The caller's role in a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserRole {
    pub user_id: i64,
    pub group_id: i64,
    pub role_id: MemberRole,
    pub role_name: String,
}

impl UserRole {
    pub fn new(group_id: i64, user_id: i64, role: MemberRole) -> Self {
        Self {
            user_id,
            group_id,
            role_id: role,
            role_name: role.as_str().to_string(),
        }
    }
}

/// Group detail returned to a member: the group plus the caller's role.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub user_role: UserRole,
}

/// Group preview in the caller's group list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupPreview {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub avatar_url: String,
    pub user_id: i64,
    pub user_role: UserRole,
    pub status: GroupStatus,
    pub count: i64,
}

/// Query parameters for listing the caller's groups.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListGroupsQuery {
    pub group_id: Option<i64>,
}

/// Response for listing groups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListGroupsResponse {
    pub data: Vec<GroupPreview>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(url: &str) -> GroupDraft {
        GroupDraft {
            title: "Flatmates".to_string(),
            description: "Shared bills".to_string(),
            url: url.to_string(),
            avatar_url: String::new(),
        }
    }

    #[test]
    fn test_member_role_ids() {
        assert_eq!(MemberRole::Creator.id(), 1);
        assert_eq!(MemberRole::Admin.id(), 2);
        assert_eq!(MemberRole::Dweller.id(), 3);
        assert_eq!(MemberRole::from_id(2), Some(MemberRole::Admin));
        assert_eq!(MemberRole::from_id(0), None);
        assert_eq!(MemberRole::from_id(4), None);
    }

    #[test]
    fn test_member_role_serializes_as_id() {
        assert_eq!(serde_json::to_string(&MemberRole::Admin).unwrap(), "2");
        let role: MemberRole = serde_json::from_str("3").unwrap();
        assert_eq!(role, MemberRole::Dweller);
        assert!(serde_json::from_str::<MemberRole>("9").is_err());
    }

    #[test]
    fn test_group_status_conversion() {
        assert_eq!(GroupStatus::try_from(1).unwrap(), GroupStatus::Active);
        assert_eq!(GroupStatus::try_from(2).unwrap(), GroupStatus::Deleted);
        assert!(GroupStatus::try_from(3).is_err());
    }

    #[test]
    fn test_draft_url_length_boundaries() {
        assert!(draft("ab").validate().is_err());
        assert!(draft("abc").validate().is_ok());
        assert!(draft(&"a".repeat(20)).validate().is_ok());
        assert!(draft(&"a".repeat(21)).validate().is_err());
    }

    #[test]
    fn test_draft_title_and_description_limits() {
        let mut d = draft("family");
        d.title = "t".repeat(100);
        assert!(d.validate().is_ok());
        d.title = "t".repeat(101);
        assert!(d.validate().is_err());

        let mut d = draft("family");
        d.description = "d".repeat(500);
        assert!(d.validate().is_ok());
        d.description = "d".repeat(501);
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_draft_blank_title() {
        let mut d = draft("family");
        d.title = "   ".to_string();
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_draft_lengths_count_characters() {
        // Twenty Cyrillic letters are forty bytes but twenty characters.
        let d = draft(&"ж".repeat(20));
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_user_role_new() {
        let role = UserRole::new(7, 42, MemberRole::Admin);
        assert_eq!(role.group_id, 7);
        assert_eq!(role.user_id, 42);
        assert_eq!(role.role_name, "admin");
    }
}
