//! Group service: group lifecycle, membership and invite links.

use std::collections::HashSet;
use std::sync::Arc;

use validator::Validate;

use super::account::AccountClient;
use super::notifier::{InviteLetter, InviteNotifier, NotificationResult};
use super::store::GroupStore;
use crate::error::{AggregateError, GroupError, StoreError};
use crate::models::invite_link::{generate_link_token, link_from_token, token_from_link};
use crate::models::{
    AddInviteLinkResponse, AuthorInfo, ChangeRoleRequest, ChangeRoleResponse, ExpelUserRequest,
    ExpelUserResponse, Group, GroupAction, GroupDetail, GroupDraft, GroupStatus,
    InviteLinkSummary, InviteUserRequest, InviteUserResponse, ListGroupsResponse,
    ListInviteLinksResponse, ListMembersResponse, MemberRole, MemberTarget, MembershipView,
    RemoveInviteLinkResponse, ResolveInviteLinkResponse, UserRole,
};

/// Attempts at generating an unused invite token before giving up.
pub const MAX_TOKEN_ATTEMPTS: usize = 3;

/// Default public prefix for invite links.
pub const DEFAULT_LINK_PREFIX: &str = "http://nl-mail.ru/welcome";

/// Produces fresh invite tokens.
pub type TokenSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Result of a batch call that may succeed for only some items.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T> {
    pub value: T,
    pub errors: Option<AggregateError>,
}

impl<T> Partial<T> {
    fn new(value: T, errors: AggregateError) -> Self {
        Self {
            value,
            errors: errors.into_option(),
        }
    }
}

#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn GroupStore>,
    accounts: Arc<dyn AccountClient>,
    notifier: Option<Arc<dyn InviteNotifier>>,
    link_prefix: String,
    token_source: TokenSource,
}

impl GroupService {
    pub fn new(store: Arc<dyn GroupStore>, accounts: Arc<dyn AccountClient>) -> Self {
        Self {
            store,
            accounts,
            notifier: None,
            link_prefix: DEFAULT_LINK_PREFIX.to_string(),
            token_source: Arc::new(generate_link_token),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn InviteNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_link_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.link_prefix = prefix.into();
        self
    }

    pub fn with_token_source(mut self, source: TokenSource) -> Self {
        self.token_source = source;
        self
    }

    pub fn link_prefix(&self) -> &str {
        &self.link_prefix
    }

    pub async fn health_check(&self) -> Result<(), GroupError> {
        self.store.health_check().await.map_err(GroupError::from)
    }

    // ------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------

    /// Decide whether `user_id` may perform `action` on `group`.
    ///
    /// `Create` is allowed when the group has no owner yet or the user owns
    /// it. Every other action is decided by the user's role; a missing
    /// membership yields [`GroupError::NoMembership`] and an insufficient
    /// role yields [`GroupError::NoPermission`].
    pub async fn check_permission(
        &self,
        group: &Group,
        action: GroupAction,
        user_id: i64,
    ) -> Result<(), GroupError> {
        if action == GroupAction::Create {
            return if group.create_by == 0 || group.create_by == user_id {
                Ok(())
            } else {
                Err(GroupError::NoPermission)
            };
        }
        self.authorize(group.id, action, user_id).await.map(|_| ())
    }

    /// Permission check by ids for other services. Denials are `Ok(false)`.
    pub async fn is_allowed(
        &self,
        group_id: i64,
        action: GroupAction,
        user_id: i64,
    ) -> Result<bool, GroupError> {
        let group = self.store.select_group_by_id(group_id).await?;
        match self.check_permission(&group, action, user_id).await {
            Ok(()) => Ok(true),
            Err(GroupError::NoMembership) | Err(GroupError::NoPermission) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn authorize(
        &self,
        group_id: i64,
        action: GroupAction,
        user_id: i64,
    ) -> Result<MemberRole, GroupError> {
        let role = self
            .store
            .select_group_role(group_id, user_id)
            .await?
            .ok_or(GroupError::NoMembership)?;

        if role.allows(action) {
            Ok(role)
        } else {
            tracing::debug!(group_id, user_id, action = %action, role = %role, "Permission denied");
            Err(GroupError::NoPermission)
        }
    }

    // ------------------------------------------------------------------
    // Group lifecycle
    // ------------------------------------------------------------------

    /// Create a group owned by `creator_id`, who becomes its Creator.
    pub async fn create(&self, draft: GroupDraft, creator_id: i64) -> Result<Group, GroupError> {
        draft.validate()?;
        self.ensure_url_available(&draft.url).await?;

        let group = self
            .store
            .insert_group_with_creator(&draft, creator_id)
            .await?;

        tracing::info!(group_id = group.id, user_id = creator_id, "Group created");
        Ok(group)
    }

    /// Slugs are not unique today; this is where a uniqueness rule would go.
    async fn ensure_url_available(&self, _url: &str) -> Result<(), GroupError> {
        Ok(())
    }

    pub async fn update(
        &self,
        group_id: i64,
        draft: GroupDraft,
        user_id: i64,
    ) -> Result<Group, GroupError> {
        let group = self.store.select_group_by_id(group_id).await?;
        self.check_permission(&group, GroupAction::Edit, user_id).await?;
        draft.validate()?;

        let group = self.store.update_group(group_id, &draft).await?;
        tracing::info!(group_id, user_id, "Group updated");
        Ok(group)
    }

    /// Soft delete: the row is kept with status Deleted.
    pub async fn delete(&self, group_id: i64, user_id: i64) -> Result<Group, GroupError> {
        let group = self.store.select_group_by_id(group_id).await?;
        self.check_permission(&group, GroupAction::Remove, user_id).await?;

        let group = self
            .store
            .update_group_status(group_id, GroupStatus::Deleted)
            .await?;
        tracing::info!(group_id, user_id, "Group deleted");
        Ok(group)
    }

    pub async fn get(&self, group_id: i64, user_id: i64) -> Result<GroupDetail, GroupError> {
        let group = self.store.select_group_by_id(group_id).await?;
        let role = self.authorize(group_id, GroupAction::Get, user_id).await?;

        Ok(GroupDetail {
            group,
            user_role: UserRole::new(group_id, user_id, role),
        })
    }

    /// The caller's groups, deleted ones included.
    pub async fn get_list(
        &self,
        user_id: i64,
        group_id: Option<i64>,
    ) -> Result<ListGroupsResponse, GroupError> {
        let data = self.store.select_groups_by_user_id(user_id, group_id).await?;
        let count = data.len();
        Ok(ListGroupsResponse { data, count })
    }

    pub async fn internal_get_list(
        &self,
        user_id: i64,
        group_id: Option<i64>,
    ) -> Result<ListGroupsResponse, GroupError> {
        self.get_list(user_id, group_id).await
    }

    pub async fn get_user_role(&self, group_id: i64, user_id: i64) -> Result<UserRole, GroupError> {
        let role = self
            .store
            .select_group_role(group_id, user_id)
            .await?
            .ok_or(GroupError::NoMembership)?;
        Ok(UserRole::new(group_id, user_id, role))
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Add users by id and by email.
    ///
    /// Unknown emails get a placeholder account and an invite letter sent in
    /// the background. Insert failures are collected per user.
    pub async fn invite(
        &self,
        group_id: i64,
        request: InviteUserRequest,
        user_id: i64,
    ) -> Result<Partial<InviteUserResponse>, GroupError> {
        if request.role == MemberRole::Creator {
            return Err(GroupError::Validation(
                "Creator role cannot be granted by invite".to_string(),
            ));
        }
        for email in &request.user_emails {
            validate_email(email)?;
        }

        self.authorize(group_id, GroupAction::Invite, user_id).await?;

        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(request.user_ids.len() + request.user_emails.len());
        for id in &request.user_ids {
            if seen.insert(*id) {
                ids.push(*id);
            }
        }

        for email in &request.user_emails {
            let account = match self.accounts.user_by_email(email).await? {
                Some(account) => account,
                None => {
                    let account = self.accounts.create_user(email).await?;
                    tracing::info!(group_id, invited_user_id = account.id, "Placeholder account created");
                    self.spawn_invite_letter(email.clone(), group_id, user_id);
                    account
                }
            };
            if seen.insert(account.id) {
                ids.push(account.id);
            }
        }

        let mut errors = AggregateError::new();
        let mut added = Vec::with_capacity(ids.len());
        for (index, id) in ids.into_iter().enumerate() {
            match self.store.insert_user(group_id, id, request.role).await {
                Ok(()) => added.push(id),
                Err(err) => errors.push(index, err.to_string()),
            }
        }

        tracing::info!(
            group_id,
            user_id,
            added = added.len(),
            failed = errors.len(),
            "Users invited"
        );

        Ok(Partial::new(
            InviteUserResponse {
                group_id,
                role: request.role,
                user_ids: added,
            },
            errors,
        ))
    }

    fn spawn_invite_letter(&self, email: String, group_id: i64, admin_id: i64) {
        if self.notifier.is_none() {
            tracing::debug!(group_id, "No invite notifier configured, skipping letter");
            return;
        }
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(err) = service.send_invite_letter(&email, group_id, admin_id).await {
                tracing::warn!(group_id, error = %err, "Cannot send invite letter");
            }
        });
    }

    async fn send_invite_letter(
        &self,
        email: &str,
        group_id: i64,
        admin_id: i64,
    ) -> Result<(), GroupError> {
        let Some(notifier) = self.notifier.as_ref() else {
            return Ok(());
        };

        let admin = self.accounts.user_by_id(admin_id).await?;
        let group = self.store.select_group_by_id(group_id).await?;
        let link = self.add_group_invite_link(group_id, admin_id).await?;

        let letter = InviteLetter {
            recipient: email.to_string(),
            admin_name: admin.full_name(),
            admin_email: admin.email,
            group_title: group.title,
            link: link.link,
        };

        match notifier.send_invite(letter).await {
            NotificationResult::Queued => Ok(()),
            NotificationResult::Failed(reason) => Err(GroupError::Internal(reason)),
        }
    }

    pub async fn change_role(
        &self,
        request: ChangeRoleRequest,
        user_id: i64,
    ) -> Result<ChangeRoleResponse, GroupError> {
        if request.role == MemberRole::Creator {
            return Err(GroupError::Validation(
                "Creator role cannot be assigned".to_string(),
            ));
        }
        self.authorize(request.group_id, GroupAction::EditRole, user_id).await?;

        let target_id = self.resolve_target(&request.target).await?;
        self.store
            .edit_user_role(request.group_id, target_id, request.role)
            .await?;

        tracing::info!(
            group_id = request.group_id,
            user_id,
            target_user_id = target_id,
            role = %request.role,
            "Member role changed"
        );

        Ok(ChangeRoleResponse {
            group_id: request.group_id,
            user_id: target_id,
            role: request.role,
        })
    }

    pub async fn expel_user(
        &self,
        request: ExpelUserRequest,
        user_id: i64,
    ) -> Result<ExpelUserResponse, GroupError> {
        self.authorize(request.group_id, GroupAction::Expel, user_id).await?;

        let target_id = self.resolve_target(&request.target).await?;
        self.store.remove_user(request.group_id, target_id).await?;

        tracing::info!(
            group_id = request.group_id,
            user_id,
            target_user_id = target_id,
            "Member expelled"
        );

        Ok(ExpelUserResponse {
            group_id: request.group_id,
            user_id: target_id,
            user_email: request.target.user_email,
        })
    }

    async fn resolve_target(&self, target: &MemberTarget) -> Result<i64, GroupError> {
        if let Some(id) = target.user_id {
            return Ok(id);
        }
        let email = target
            .user_email
            .as_deref()
            .ok_or_else(|| GroupError::Validation("user_id or user_email is required".to_string()))?;
        validate_email(email)?;

        self.accounts
            .user_by_email(email)
            .await?
            .map(|account| account.id)
            .ok_or_else(|| GroupError::NotFound(format!("account not found: {}", email)))
    }

    /// Members with their profiles, one account lookup per member.
    pub async fn get_membership_list(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<ListMembersResponse, GroupError> {
        self.authorize(group_id, GroupAction::Get, user_id).await?;

        let members = self.store.select_users_by_group_id(group_id).await?;
        let mut data = Vec::with_capacity(members.len());
        for member in members {
            let account = self.accounts.user_by_id(member.user_id).await?;
            data.push(MembershipView {
                user_id: member.user_id,
                group_id: member.group_id,
                role_id: member.role,
                role_name: member.role.as_str().to_string(),
                email: account.email,
                name: account.name,
                surname: account.surname,
                avatar_url: account.avatar_url,
            });
        }

        Ok(ListMembersResponse { data })
    }

    // ------------------------------------------------------------------
    // Invite links
    // ------------------------------------------------------------------

    pub async fn add_group_invite_link(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<AddInviteLinkResponse, GroupError> {
        self.authorize(group_id, GroupAction::Invite, user_id).await?;

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = (self.token_source)();
            match self.store.add_invite_link(group_id, &token, user_id).await {
                Ok(record) => {
                    tracing::info!(group_id, user_id, "Invite link created");
                    return Ok(AddInviteLinkResponse {
                        group_id,
                        link: link_from_token(&self.link_prefix, &record.token),
                    });
                }
                Err(StoreError::Conflict(_)) => {
                    tracing::warn!(group_id, attempt, "Invite token collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(GroupError::Conflict(
            "could not generate a unique invite link".to_string(),
        ))
    }

    /// Remove links given as full URLs or bare tokens.
    pub async fn remove_group_invite_link(
        &self,
        group_id: i64,
        links: Vec<String>,
        user_id: i64,
    ) -> Result<Partial<RemoveInviteLinkResponse>, GroupError> {
        self.authorize(group_id, GroupAction::Invite, user_id).await?;

        let mut errors = AggregateError::new();
        let mut removed = Vec::with_capacity(links.len());
        for (index, link) in links.into_iter().enumerate() {
            match self
                .store
                .remove_invite_link(group_id, token_from_link(&link))
                .await
            {
                Ok(()) => removed.push(link),
                Err(err) => errors.push(index, err.to_string()),
            }
        }

        tracing::info!(group_id, user_id, removed = removed.len(), "Invite links removed");

        Ok(Partial::new(
            RemoveInviteLinkResponse {
                group_id,
                links: removed,
            },
            errors,
        ))
    }

    pub async fn list_group_invite_links(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<ListInviteLinksResponse, GroupError> {
        self.authorize(group_id, GroupAction::Get, user_id).await?;

        let records = self.store.list_invite_links(group_id).await?;
        let mut links = Vec::with_capacity(records.len());
        for record in records {
            let login = match self.accounts.user_by_id(record.author).await {
                Ok(account) => account.email,
                Err(err) => {
                    tracing::debug!(author = record.author, error = %err, "Invite link author lookup failed");
                    String::new()
                }
            };
            links.push(InviteLinkSummary {
                link: link_from_token(&self.link_prefix, &record.token),
                added_at: record.added_at,
                author: AuthorInfo {
                    id: record.author,
                    login,
                },
            });
        }

        Ok(ListInviteLinksResponse { group_id, links })
    }

    /// Map a link to its group. An authenticated caller also joins as Dweller.
    pub async fn resolve_group(
        &self,
        link: &str,
        user_id: Option<i64>,
    ) -> Result<ResolveInviteLinkResponse, GroupError> {
        let token = token_from_link(link);
        let group_id = self.store.token_to_group_id(token).await?;
        let group = self.store.select_group_by_id(group_id).await?;
        if group.is_deleted() {
            return Err(GroupError::NotFound("group not found".to_string()));
        }

        let Some(user_id) = user_id else {
            return Ok(ResolveInviteLinkResponse {
                group_id,
                user_id: None,
            });
        };

        self.store
            .insert_user(group_id, user_id, MemberRole::Dweller)
            .await?;
        tracing::info!(group_id, user_id, "User joined by invite link");

        Ok(ResolveInviteLinkResponse {
            group_id,
            user_id: Some(user_id),
        })
    }
}

fn validate_email(email: &str) -> Result<(), GroupError> {
    shared::validation::validate_email_address(email)
        .map_err(|_| GroupError::Validation(format!("Invalid email address: {}", email)))
}
