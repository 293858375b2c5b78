//! In-memory collaborators for development and tests.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::account::AccountClient;
use super::store::GroupStore;
use crate::error::{AccountError, StoreError};
use crate::models::{
    Account, Group, GroupDraft, GroupPreview, GroupStatus, InviteLinkRecord, MemberRole,
    Membership, UserRole,
};

#[derive(Debug, Default)]
struct StoreState {
    next_group_id: i64,
    groups: BTreeMap<i64, Group>,
    memberships: BTreeMap<(i64, i64), MemberRole>,
    links: BTreeMap<String, InviteLinkRecord>,
}

impl StoreState {
    fn member_count(&self, group_id: i64) -> i64 {
        self.memberships
            .keys()
            .filter(|(group, _)| *group == group_id)
            .count() as i64
    }

    fn group(&self, group_id: i64) -> Result<Group, StoreError> {
        let mut group = self
            .groups
            .get(&group_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("group not found".to_string()))?;
        group.count = self.member_count(group_id);
        Ok(group)
    }
}

/// [`GroupStore`] backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryGroupStore {
    state: Mutex<StoreState>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl GroupStore for MemoryGroupStore {
    async fn insert_group_with_creator(
        &self,
        draft: &GroupDraft,
        creator_id: i64,
    ) -> Result<Group, StoreError> {
        let mut state = self.state()?;
        state.next_group_id += 1;
        let id = state.next_group_id;
        let group = Group {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            url: draft.url.clone(),
            avatar_url: draft.avatar_url.clone(),
            create_by: creator_id,
            create_at: Utc::now(),
            status: GroupStatus::Active,
            count: 0,
        };
        state.groups.insert(id, group);
        state.memberships.insert((id, creator_id), MemberRole::Creator);
        state.group(id)
    }

    async fn update_group(&self, group_id: i64, draft: &GroupDraft) -> Result<Group, StoreError> {
        let mut state = self.state()?;
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| StoreError::NotFound("group not found".to_string()))?;
        group.title = draft.title.clone();
        group.description = draft.description.clone();
        group.url = draft.url.clone();
        group.avatar_url = draft.avatar_url.clone();
        state.group(group_id)
    }

    async fn update_group_status(
        &self,
        group_id: i64,
        status: GroupStatus,
    ) -> Result<Group, StoreError> {
        let mut state = self.state()?;
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| StoreError::NotFound("group not found".to_string()))?;
        group.status = status;
        state.group(group_id)
    }

    async fn select_group_by_id(&self, group_id: i64) -> Result<Group, StoreError> {
        self.state()?.group(group_id)
    }

    async fn select_group_role(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<Option<MemberRole>, StoreError> {
        Ok(self.state()?.memberships.get(&(group_id, user_id)).copied())
    }

    async fn select_groups_by_user_id(
        &self,
        user_id: i64,
        group_id: Option<i64>,
    ) -> Result<Vec<GroupPreview>, StoreError> {
        let state = self.state()?;
        let mut previews = Vec::new();
        for (&(gid, uid), &role) in state.memberships.iter() {
            if uid != user_id || group_id.is_some_and(|filter| filter != gid) {
                continue;
            }
            let group = state.group(gid)?;
            previews.push(GroupPreview {
                id: group.id,
                title: group.title,
                description: group.description,
                url: group.url,
                avatar_url: group.avatar_url,
                user_id,
                user_role: UserRole::new(gid, user_id, role),
                status: group.status,
                count: group.count,
            });
        }
        Ok(previews)
    }

    async fn insert_user(
        &self,
        group_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        if !state.groups.contains_key(&group_id) {
            return Err(StoreError::NotFound("group not found".to_string()));
        }
        if state.memberships.contains_key(&(group_id, user_id)) {
            return Err(StoreError::Conflict("exists".to_string()));
        }
        state.memberships.insert((group_id, user_id), role);
        Ok(())
    }

    async fn edit_user_role(
        &self,
        group_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state.memberships.get_mut(&(group_id, user_id)) {
            Some(current) => {
                *current = role;
                Ok(())
            }
            None => Err(StoreError::NotFound("membership not found".to_string())),
        }
    }

    async fn remove_user(&self, group_id: i64, user_id: i64) -> Result<(), StoreError> {
        self.state()?
            .memberships
            .remove(&(group_id, user_id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("removed nothing".to_string()))
    }

    async fn select_users_by_group_id(&self, group_id: i64) -> Result<Vec<Membership>, StoreError> {
        Ok(self
            .state()?
            .memberships
            .iter()
            .filter(|((gid, _), _)| *gid == group_id)
            .map(|(&(group_id, user_id), &role)| Membership {
                group_id,
                user_id,
                role,
            })
            .collect())
    }

    async fn add_invite_link(
        &self,
        group_id: i64,
        token: &str,
        author: i64,
    ) -> Result<InviteLinkRecord, StoreError> {
        let mut state = self.state()?;
        if !state.groups.contains_key(&group_id) {
            return Err(StoreError::NotFound("group not found".to_string()));
        }
        if state.links.contains_key(token) {
            return Err(StoreError::Conflict("exists".to_string()));
        }
        let record = InviteLinkRecord {
            group_id,
            token: token.to_string(),
            author,
            added_at: Utc::now(),
        };
        state.links.insert(token.to_string(), record.clone());
        Ok(record)
    }

    async fn remove_invite_link(&self, group_id: i64, token: &str) -> Result<(), StoreError> {
        let mut state = self.state()?;
        match state.links.get(token) {
            Some(record) if record.group_id == group_id => {
                state.links.remove(token);
                Ok(())
            }
            _ => Err(StoreError::NotFound("removed nothing".to_string())),
        }
    }

    async fn list_invite_links(&self, group_id: i64) -> Result<Vec<InviteLinkRecord>, StoreError> {
        let state = self.state()?;
        let mut links: Vec<InviteLinkRecord> = state
            .links
            .values()
            .filter(|record| record.group_id == group_id)
            .cloned()
            .collect();
        links.sort_by_key(|record| record.added_at);
        Ok(links)
    }

    async fn token_to_group_id(&self, token: &str) -> Result<i64, StoreError> {
        self.state()?
            .links
            .get(token)
            .map(|record| record.group_id)
            .ok_or_else(|| StoreError::NotFound("invite link not found".to_string()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.state().map(|_| ())
    }
}

#[derive(Debug, Default)]
struct AccountState {
    next_id: i64,
    accounts: Vec<Account>,
}

/// [`AccountClient`] backed by an in-process account list.
#[derive(Debug, Default)]
pub struct MockAccountClient {
    state: Mutex<AccountState>,
    /// Whether placeholder creation should fail.
    pub fail_create: bool,
}

impl MockAccountClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client whose placeholder creation always fails.
    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    /// Register an existing account.
    pub fn with_account(self, id: i64, email: &str, name: &str, surname: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.next_id = state.next_id.max(id);
            state.accounts.push(Account {
                id,
                email: email.to_string(),
                name: name.to_string(),
                surname: surname.to_string(),
                avatar_url: String::new(),
            });
        }
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, AccountState>, AccountError> {
        self.state
            .lock()
            .map_err(|_| AccountError::Upstream("account state poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl AccountClient for MockAccountClient {
    async fn user_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        Ok(self
            .state()?
            .accounts
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn user_by_id(&self, user_id: i64) -> Result<Account, AccountError> {
        self.state()?
            .accounts
            .iter()
            .find(|account| account.id == user_id)
            .cloned()
            .ok_or_else(|| AccountError::NotFound(user_id.to_string()))
    }

    async fn create_user(&self, email: &str) -> Result<Account, AccountError> {
        if self.fail_create {
            return Err(AccountError::Upstream("account service unavailable".to_string()));
        }
        let mut state = self.state()?;
        state.next_id += 1;
        let account = Account {
            id: state.next_id,
            email: email.to_string(),
            ..Account::default()
        };
        state.accounts.push(account.clone());
        Ok(account)
    }
}
