//! Service-to-service routes, guarded by the internal secret.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::{
    CheckPermissionQuery, CheckPermissionResponse, GroupAction, InternalListGroupsQuery,
    ListGroupsResponse, UserGroupQuery, UserRole,
};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /internal/group/list?user_id=&group_id=
pub async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<InternalListGroupsQuery>,
) -> Result<Json<ListGroupsResponse>, ApiError> {
    let response = state
        .groups
        .internal_get_list(query.user_id, query.group_id)
        .await?;
    Ok(Json(response))
}

/// The user's role in a group. 403 when they are not a member.
///
/// GET /internal/group/permission?user_id=&group_id=
pub async fn user_role(
    State(state): State<AppState>,
    Query(query): Query<UserGroupQuery>,
) -> Result<Json<UserRole>, ApiError> {
    let role = state
        .groups
        .get_user_role(query.group_id, query.user_id)
        .await?;
    Ok(Json(role))
}

/// Whether the user may perform an action. Denials are `allowed: false`.
///
/// GET /internal/group/check-permission?user_id=&group_id=&action_id=
pub async fn check_permission(
    State(state): State<AppState>,
    Query(query): Query<CheckPermissionQuery>,
) -> Result<Json<CheckPermissionResponse>, ApiError> {
    let action = GroupAction::try_from(query.action_id).map_err(ApiError::Validation)?;

    let allowed = state
        .groups
        .is_allowed(query.group_id, action, query.user_id)
        .await?;

    Ok(Json(CheckPermissionResponse {
        user_id: query.user_id,
        group_id: query.group_id,
        action_id: action,
        allowed,
    }))
}
