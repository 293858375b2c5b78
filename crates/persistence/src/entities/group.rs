//! Group entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::error::StoreError;
use domain::models::{Group, GroupPreview, GroupStatus, MemberRole, UserRole};
use sqlx::FromRow;

/// Row of the `groups` table plus the member count.
#[derive(Debug, Clone, FromRow)]
pub struct GroupEntity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub avatar_url: String,
    pub create_by: i64,
    pub create_at: DateTime<Utc>,
    pub status_id: i16,
    pub count: i64,
}

impl TryFrom<GroupEntity> for Group {
    type Error = StoreError;

    fn try_from(entity: GroupEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            url: entity.url,
            avatar_url: entity.avatar_url,
            create_by: entity.create_by,
            create_at: entity.create_at,
            status: GroupStatus::try_from(entity.status_id).map_err(StoreError::Backend)?,
            count: entity.count,
        })
    }
}

/// A group joined with one user's membership.
#[derive(Debug, Clone, FromRow)]
pub struct GroupPreviewEntity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub avatar_url: String,
    pub user_id: i64,
    pub role_id: i16,
    pub status_id: i16,
    pub count: i64,
}

impl TryFrom<GroupPreviewEntity> for GroupPreview {
    type Error = StoreError;

    fn try_from(entity: GroupPreviewEntity) -> Result<Self, Self::Error> {
        let role = MemberRole::try_from(entity.role_id).map_err(StoreError::Backend)?;
        Ok(Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            url: entity.url,
            avatar_url: entity.avatar_url,
            user_id: entity.user_id,
            user_role: UserRole::new(entity.id, entity.user_id, role),
            status: GroupStatus::try_from(entity.status_id).map_err(StoreError::Backend)?,
            count: entity.count,
        })
    }
}
