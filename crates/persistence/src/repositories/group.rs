//! Group repository: PostgreSQL implementation of [`GroupStore`].

use domain::error::StoreError;
use domain::models::{
    Group, GroupDraft, GroupPreview, GroupStatus, InviteLinkRecord, MemberRole, Membership,
};
use domain::services::GroupStore;
use sqlx::PgPool;

use crate::entities::{GroupEntity, GroupPreviewEntity, InviteLinkEntity, MembershipEntity};
use crate::metrics::QueryTimer;

const GROUP_COLUMNS: &str = r#"
    g.id, g.title, g.description, g.url, g.avatar_url, g.create_by, g.create_at, g.status_id,
    (SELECT COUNT(*) FROM users_groups ug WHERE ug.group_id = g.id) AS count
"#;

/// Map a driver error onto the storage port's error kinds.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound("not found".into()),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StoreError::Conflict("exists".into()),
            Some("23503") => StoreError::NotFound("referenced group not found".into()),
            _ => {
                tracing::error!(error = %db_err, "Database error");
                StoreError::Backend(format!("Database error: {}", db_err))
            }
        },
        _ => {
            tracing::error!(error = %err, "Database error");
            StoreError::Backend(format!("Database error: {}", err))
        }
    }
}

fn group_not_found() -> StoreError {
    StoreError::NotFound("group not found".into())
}

/// Repository for group-related database operations.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Creates a new GroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_group(&self, group_id: i64) -> Result<Option<GroupEntity>, sqlx::Error> {
        let sql = format!("SELECT {} FROM groups g WHERE g.id = $1", GROUP_COLUMNS);
        sqlx::query_as::<_, GroupEntity>(&sql)
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[async_trait::async_trait]
impl GroupStore for GroupRepository {
    async fn insert_group_with_creator(
        &self,
        draft: &GroupDraft,
        creator_id: i64,
    ) -> Result<Group, StoreError> {
        let timer = QueryTimer::new("insert_group_with_creator");

        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let group = sqlx::query_as::<_, GroupEntity>(
            r#"
            INSERT INTO groups (title, description, url, create_by, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, url, avatar_url, create_by, create_at, status_id,
                      1::BIGINT AS count
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.url)
        .bind(creator_id)
        .bind(&draft.avatar_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        sqlx::query(
            r#"
            INSERT INTO users_groups (group_id, user_id, role_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(group.id)
        .bind(creator_id)
        .bind(MemberRole::Creator.id())
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        timer.record();
        Group::try_from(group)
    }

    async fn update_group(&self, group_id: i64, draft: &GroupDraft) -> Result<Group, StoreError> {
        let timer = QueryTimer::new("update_group");
        let sql = format!(
            r#"
            WITH g AS (
                UPDATE groups
                SET title = $1, description = $2, url = $3, avatar_url = $4
                WHERE id = $5
                RETURNING *
            )
            SELECT {} FROM g
            "#,
            GROUP_COLUMNS
        );
        let result = sqlx::query_as::<_, GroupEntity>(&sql)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(&draft.url)
            .bind(&draft.avatar_url)
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();

        result
            .map_err(store_error)?
            .ok_or_else(group_not_found)
            .and_then(Group::try_from)
    }

    async fn update_group_status(
        &self,
        group_id: i64,
        status: GroupStatus,
    ) -> Result<Group, StoreError> {
        let timer = QueryTimer::new("update_group_status");
        let sql = format!(
            r#"
            WITH g AS (
                UPDATE groups SET status_id = $1 WHERE id = $2
                RETURNING *
            )
            SELECT {} FROM g
            "#,
            GROUP_COLUMNS
        );
        let result = sqlx::query_as::<_, GroupEntity>(&sql)
            .bind(status.id())
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();

        result
            .map_err(store_error)?
            .ok_or_else(group_not_found)
            .and_then(Group::try_from)
    }

    async fn select_group_by_id(&self, group_id: i64) -> Result<Group, StoreError> {
        let timer = QueryTimer::new("select_group_by_id");
        let result = self.fetch_group(group_id).await;
        timer.record();

        result
            .map_err(store_error)?
            .ok_or_else(group_not_found)
            .and_then(Group::try_from)
    }

    async fn select_group_role(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<Option<MemberRole>, StoreError> {
        let timer = QueryTimer::new("select_group_role");
        let result: Result<Option<i16>, sqlx::Error> = sqlx::query_scalar(
            r#"
            SELECT role_id FROM users_groups
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(store_error)?
            .map(|id| MemberRole::try_from(id).map_err(StoreError::Backend))
            .transpose()
    }

    async fn select_groups_by_user_id(
        &self,
        user_id: i64,
        group_id: Option<i64>,
    ) -> Result<Vec<GroupPreview>, StoreError> {
        let timer = QueryTimer::new("select_groups_by_user_id");
        let result = sqlx::query_as::<_, GroupPreviewEntity>(
            r#"
            SELECT g.id, g.title, g.description, g.url, g.avatar_url,
                   ug.user_id, ug.role_id, g.status_id,
                   (SELECT COUNT(*) FROM users_groups c WHERE c.group_id = g.id) AS count
            FROM groups g
            JOIN users_groups ug ON ug.group_id = g.id
            WHERE ug.user_id = $1 AND ($2::BIGINT IS NULL OR g.id = $2)
            ORDER BY g.id
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map_err(store_error)?
            .into_iter()
            .map(GroupPreview::try_from)
            .collect()
    }

    async fn insert_user(
        &self,
        group_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> Result<(), StoreError> {
        let timer = QueryTimer::new("insert_user");
        let result = sqlx::query(
            r#"
            INSERT INTO users_groups (group_id, user_id, role_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(role.id())
        .execute(&self.pool)
        .await;
        timer.record();

        result.map(|_| ()).map_err(store_error)
    }

    async fn edit_user_role(
        &self,
        group_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> Result<(), StoreError> {
        let timer = QueryTimer::new("edit_user_role");
        let result = sqlx::query(
            r#"
            UPDATE users_groups SET role_id = $1
            WHERE group_id = $2 AND user_id = $3
            "#,
        )
        .bind(role.id())
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.record();

        match result.map_err(store_error)?.rows_affected() {
            0 => Err(StoreError::NotFound("membership not found".into())),
            _ => Ok(()),
        }
    }

    async fn remove_user(&self, group_id: i64, user_id: i64) -> Result<(), StoreError> {
        let timer = QueryTimer::new("remove_user");
        let result = sqlx::query("DELETE FROM users_groups WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.pool)
            .await;
        timer.record();

        match result.map_err(store_error)?.rows_affected() {
            0 => Err(StoreError::NotFound("removed nothing".into())),
            _ => Ok(()),
        }
    }

    async fn select_users_by_group_id(&self, group_id: i64) -> Result<Vec<Membership>, StoreError> {
        let timer = QueryTimer::new("select_users_by_group_id");
        let result = sqlx::query_as::<_, MembershipEntity>(
            r#"
            SELECT group_id, user_id, role_id FROM users_groups
            WHERE group_id = $1
            ORDER BY role_id, user_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map_err(store_error)?
            .into_iter()
            .map(Membership::try_from)
            .collect()
    }

    async fn add_invite_link(
        &self,
        group_id: i64,
        token: &str,
        author: i64,
    ) -> Result<InviteLinkRecord, StoreError> {
        let timer = QueryTimer::new("add_invite_link");
        let result = sqlx::query_as::<_, InviteLinkEntity>(
            r#"
            INSERT INTO group_links (group_id, link, author)
            VALUES ($1, $2, $3)
            RETURNING group_id, link, author, created
            "#,
        )
        .bind(group_id)
        .bind(token)
        .bind(author)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(InviteLinkRecord::from).map_err(store_error)
    }

    async fn remove_invite_link(&self, group_id: i64, token: &str) -> Result<(), StoreError> {
        let timer = QueryTimer::new("remove_invite_link");
        let result = sqlx::query("DELETE FROM group_links WHERE group_id = $1 AND link = $2")
            .bind(group_id)
            .bind(token)
            .execute(&self.pool)
            .await;
        timer.record();

        match result.map_err(store_error)?.rows_affected() {
            0 => Err(StoreError::NotFound("removed nothing".into())),
            _ => Ok(()),
        }
    }

    async fn list_invite_links(&self, group_id: i64) -> Result<Vec<InviteLinkRecord>, StoreError> {
        let timer = QueryTimer::new("list_invite_links");
        let result = sqlx::query_as::<_, InviteLinkEntity>(
            r#"
            SELECT group_id, link, author, created FROM group_links
            WHERE group_id = $1
            ORDER BY created
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(InviteLinkRecord::from)
            .collect())
    }

    async fn token_to_group_id(&self, token: &str) -> Result<i64, StoreError> {
        let timer = QueryTimer::new("token_to_group_id");
        let result: Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT group_id FROM group_links WHERE link = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await;
        timer.record();

        result
            .map_err(store_error)?
            .ok_or_else(|| StoreError::NotFound("invite link not found".into()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }
}
