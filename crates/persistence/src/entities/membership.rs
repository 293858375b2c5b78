//! Membership entity (database row mapping).

use domain::error::StoreError;
use domain::models::{MemberRole, Membership};
use sqlx::FromRow;

/// Row of the `users_groups` table.
#[derive(Debug, Clone, FromRow)]
pub struct MembershipEntity {
    pub group_id: i64,
    pub user_id: i64,
    pub role_id: i16,
}

impl TryFrom<MembershipEntity> for Membership {
    type Error = StoreError;

    fn try_from(entity: MembershipEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            group_id: entity.group_id,
            user_id: entity.user_id,
            role: MemberRole::try_from(entity.role_id).map_err(StoreError::Backend)?,
        })
    }
}
