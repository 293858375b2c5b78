//! Group lifecycle routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::{Group, GroupDetail, GroupDraft, ListGroupsQuery, ListGroupsResponse};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Create a group. The caller becomes its creator.
///
/// POST /group/group
pub async fn create_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(draft): Json<GroupDraft>,
) -> Result<Json<Group>, ApiError> {
    let group = state.groups.create(draft, user_auth.user_id).await?;
    Ok(Json(group))
}

/// Get a group with the caller's role in it.
///
/// GET /group/group/:group_id
pub async fn get_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupDetail>, ApiError> {
    let detail = state.groups.get(group_id, user_auth.user_id).await?;
    Ok(Json(detail))
}

/// Replace the editable fields of a group.
///
/// PUT /group/group/:group_id
pub async fn update_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<i64>,
    Json(draft): Json<GroupDraft>,
) -> Result<Json<Group>, ApiError> {
    let group = state
        .groups
        .update(group_id, draft, user_auth.user_id)
        .await?;
    Ok(Json(group))
}

/// Soft-delete a group.
///
/// DELETE /group/group/:group_id
pub async fn delete_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<i64>,
) -> Result<Json<Group>, ApiError> {
    let group = state.groups.delete(group_id, user_auth.user_id).await?;
    Ok(Json(group))
}

/// List the caller's groups.
///
/// GET /group/list?group_id=
pub async fn list_groups(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListGroupsQuery>,
) -> Result<Json<ListGroupsResponse>, ApiError> {
    let response = state
        .groups
        .get_list(user_auth.user_id, query.group_id)
        .await?;

    info!(
        user_id = user_auth.user_id,
        group_count = response.count,
        group_filter = ?query.group_id,
        "Listed user groups"
    );

    Ok(Json(response))
}
