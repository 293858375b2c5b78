//! Storage port for groups, memberships and invite links.

use crate::error::StoreError;
use crate::models::{Group, GroupDraft, GroupPreview, GroupStatus, InviteLinkRecord, MemberRole, Membership};

/// Relational storage used by [`super::GroupService`].
///
/// Implementations report a duplicate row as `StoreError::Conflict("exists")`
/// and a missing row as `StoreError::NotFound`.
#[async_trait::async_trait]
pub trait GroupStore: Send + Sync {
    /// Insert a group and its creator's membership (role Creator) atomically.
    async fn insert_group_with_creator(
        &self,
        draft: &GroupDraft,
        creator_id: i64,
    ) -> Result<Group, StoreError>;

    /// Replace the editable fields of a group.
    async fn update_group(&self, group_id: i64, draft: &GroupDraft) -> Result<Group, StoreError>;

    async fn update_group_status(
        &self,
        group_id: i64,
        status: GroupStatus,
    ) -> Result<Group, StoreError>;

    async fn select_group_by_id(&self, group_id: i64) -> Result<Group, StoreError>;

    /// The user's role in the group, `None` when they are not a member.
    async fn select_group_role(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<Option<MemberRole>, StoreError>;

    /// Previews of every group the user belongs to, optionally narrowed to one group.
    async fn select_groups_by_user_id(
        &self,
        user_id: i64,
        group_id: Option<i64>,
    ) -> Result<Vec<GroupPreview>, StoreError>;

    async fn insert_user(
        &self,
        group_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> Result<(), StoreError>;

    async fn edit_user_role(
        &self,
        group_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> Result<(), StoreError>;

    async fn remove_user(&self, group_id: i64, user_id: i64) -> Result<(), StoreError>;

    async fn select_users_by_group_id(&self, group_id: i64) -> Result<Vec<Membership>, StoreError>;

    async fn add_invite_link(
        &self,
        group_id: i64,
        token: &str,
        author: i64,
    ) -> Result<InviteLinkRecord, StoreError>;

    async fn remove_invite_link(&self, group_id: i64, token: &str) -> Result<(), StoreError>;

    async fn list_invite_links(&self, group_id: i64) -> Result<Vec<InviteLinkRecord>, StoreError>;

    /// The group a token belongs to.
    async fn token_to_group_id(&self, token: &str) -> Result<i64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
