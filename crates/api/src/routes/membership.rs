//! Membership routes: listing, inviting, role changes and expulsion.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{
    ChangeRoleRequest, ChangeRoleResponse, ExpelUserRequest, ExpelUserResponse,
    InviteUserRequest, InviteUserResponse, ListMembersResponse,
};
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_batch;
use crate::routes::PartialBody;

/// Members of a group with their profiles.
///
/// GET /group/membership/:group_id
pub async fn list_members(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<i64>,
) -> Result<Json<ListMembersResponse>, ApiError> {
    let response = state
        .groups
        .get_membership_list(group_id, user_auth.user_id)
        .await?;
    Ok(Json(response))
}

/// Add users by id or email.
///
/// PUT /group/membership/:group_id
///
/// Answers 200 with the ids that were added and an `error` summary when some
/// of them failed.
pub async fn invite_users(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<i64>,
    Json(request): Json<InviteUserRequest>,
) -> Result<Json<PartialBody<InviteUserResponse>>, ApiError> {
    let partial = state
        .groups
        .invite(group_id, request, user_auth.user_id)
        .await?;

    let added = partial.value.user_ids.len();
    let failed = partial.errors.as_ref().map_or(0, |e| e.len());
    record_batch("invite", added, failed);

    if failed > 0 {
        warn!(group_id, added, failed, "Invite partially failed");
    }

    Ok(Json(partial.into()))
}

/// Change a member's role.
///
/// POST /group/membership
pub async fn change_role(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<Json<ChangeRoleResponse>, ApiError> {
    let response = state.groups.change_role(request, user_auth.user_id).await?;
    Ok(Json(response))
}

/// Remove a member from a group.
///
/// DELETE /group/membership
pub async fn expel_user(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<ExpelUserRequest>,
) -> Result<Json<ExpelUserResponse>, ApiError> {
    let response = state.groups.expel_user(request, user_auth.user_id).await?;
    Ok(Json(response))
}
