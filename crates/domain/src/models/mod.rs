//! Domain models for the group service.

pub mod account;
pub mod group;
pub mod invite_link;
pub mod membership;
pub mod permission;

pub use account::Account;
pub use group::{
    Group, GroupDetail, GroupDraft, GroupPreview, GroupStatus, ListGroupsQuery,
    ListGroupsResponse, MemberRole, UserRole,
};
pub use invite_link::{
    AddInviteLinkResponse, AuthorInfo, InviteLinkRecord, InviteLinkSummary,
    ListInviteLinksQuery, ListInviteLinksResponse, RemoveInviteLinkRequest,
    RemoveInviteLinkResponse, ResolveInviteLinkRequest, ResolveInviteLinkResponse,
};
pub use membership::{
    ChangeRoleRequest, ChangeRoleResponse, ExpelUserRequest, ExpelUserResponse,
    InviteUserRequest, InviteUserResponse, ListMembersResponse, MemberTarget, Membership,
    MembershipView,
};
pub use permission::{
    CheckPermissionQuery, CheckPermissionResponse, GroupAction, InternalListGroupsQuery,
    UserGroupQuery,
};
