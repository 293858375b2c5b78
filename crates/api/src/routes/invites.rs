//! Invite link routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::{
    AddInviteLinkResponse, ListInviteLinksQuery, ListInviteLinksResponse,
    RemoveInviteLinkRequest, RemoveInviteLinkResponse, ResolveInviteLinkRequest,
    ResolveInviteLinkResponse,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{OptionalUserAuth, UserAuth};
use crate::middleware::metrics::record_batch;
use crate::routes::PartialBody;

/// Issue a new invite link.
///
/// PUT /group/invite/:group_id
pub async fn add_invite_link(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<i64>,
) -> Result<Json<AddInviteLinkResponse>, ApiError> {
    let response = state
        .groups
        .add_group_invite_link(group_id, user_auth.user_id)
        .await?;
    Ok(Json(response))
}

/// Revoke invite links.
///
/// DELETE /group/invite
pub async fn remove_invite_links(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<RemoveInviteLinkRequest>,
) -> Result<Json<PartialBody<RemoveInviteLinkResponse>>, ApiError> {
    let group_id = request.group_id;
    let partial = state
        .groups
        .remove_group_invite_link(group_id, request.links, user_auth.user_id)
        .await?;

    let removed = partial.value.links.len();
    let failed = partial.errors.as_ref().map_or(0, |e| e.len());
    record_batch("remove_invite_link", removed, failed);

    Ok(Json(partial.into()))
}

/// List a group's invite links.
///
/// GET /group/invite/list?group_id=
pub async fn list_invite_links(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListInviteLinksQuery>,
) -> Result<Json<ListInviteLinksResponse>, ApiError> {
    let response = state
        .groups
        .list_group_invite_links(query.group_id, user_auth.user_id)
        .await?;
    Ok(Json(response))
}

/// Resolve a link given as a query parameter.
///
/// GET /group/invite/resolve?link=
pub async fn resolve_link_query(
    State(state): State<AppState>,
    OptionalUserAuth(user_auth): OptionalUserAuth,
    Query(request): Query<ResolveInviteLinkRequest>,
) -> Result<Json<ResolveInviteLinkResponse>, ApiError> {
    resolve(&state, user_auth, &request.link).await
}

/// Resolve a link given in the body.
///
/// POST /group/invite/resolve
pub async fn resolve_link(
    State(state): State<AppState>,
    OptionalUserAuth(user_auth): OptionalUserAuth,
    Json(request): Json<ResolveInviteLinkRequest>,
) -> Result<Json<ResolveInviteLinkResponse>, ApiError> {
    resolve(&state, user_auth, &request.link).await
}

async fn resolve(
    state: &AppState,
    user_auth: Option<UserAuth>,
    link: &str,
) -> Result<Json<ResolveInviteLinkResponse>, ApiError> {
    let user_id = user_auth.map(|auth| auth.user_id);
    let response = state.groups.resolve_group(link, user_id).await?;
    Ok(Json(response))
}
