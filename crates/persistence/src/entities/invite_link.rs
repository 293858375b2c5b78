//! Invite link entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::InviteLinkRecord;
use sqlx::FromRow;

/// Row of the `group_links` table. `link` holds the bare token.
#[derive(Debug, Clone, FromRow)]
pub struct InviteLinkEntity {
    pub group_id: i64,
    pub link: String,
    pub author: i64,
    pub created: DateTime<Utc>,
}

impl From<InviteLinkEntity> for InviteLinkRecord {
    fn from(entity: InviteLinkEntity) -> Self {
        Self {
            group_id: entity.group_id,
            token: entity.link,
            author: entity.author,
            added_at: entity.created,
        }
    }
}
