//! Invite link models and the token/link codec.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of a generated invite token.
pub const TOKEN_LENGTH: usize = 10;

lazy_static::lazy_static! {
    static ref INVITE_LINK_REGEX: regex::Regex =
        regex::Regex::new(r"https?://.*/(\w+)/?").unwrap();
}

/// Generate a fresh random invite token.
pub fn generate_link_token() -> String {
    shared::crypto::generate_token(TOKEN_LENGTH)
}

/// Render a token into the public link served to users.
pub fn link_from_token(prefix: &str, token: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), token)
}

/// Extract the token from a public link.
///
/// Anything that does not look like an `http(s)://.../token` URL is taken
/// to be the bare token itself.
pub fn token_from_link(link: &str) -> &str {
    INVITE_LINK_REGEX
        .captures(link)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(link)
}

/// A stored invite link as returned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct InviteLinkRecord {
    pub group_id: i64,
    pub token: String,
    pub author: i64,
    pub added_at: DateTime<Utc>,
}

/// Author of an invite link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthorInfo {
    pub id: i64,
    /// Author's login (email); empty when the account lookup failed.
    pub login: String,
}

/// Invite link in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteLinkSummary {
    pub link: String,
    pub added_at: DateTime<Utc>,
    pub author: AuthorInfo,
}

/// Response after creating an invite link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AddInviteLinkResponse {
    pub group_id: i64,
    pub link: String,
}

/// Request to remove invite links.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoveInviteLinkRequest {
    pub group_id: i64,
    pub links: Vec<String>,
}

/// Links that were actually removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoveInviteLinkResponse {
    pub group_id: i64,
    pub links: Vec<String>,
}

/// Query parameters for listing invite links.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListInviteLinksQuery {
    pub group_id: i64,
}

/// Response for listing invite links.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListInviteLinksResponse {
    pub group_id: i64,
    pub links: Vec<InviteLinkSummary>,
}

/// Request to resolve an invite link.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolveInviteLinkRequest {
    pub link: String,
}

/// Resolution result. `user_id` is set when the caller joined the group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolveInviteLinkResponse {
    pub group_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}
