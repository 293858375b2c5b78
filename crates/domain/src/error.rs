//! Domain error types.

use std::fmt;
use thiserror::Error;

/// Errors raised by storage implementations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Backend(String),
}

/// Errors raised by the account/auth service clients.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccountError {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("account service error: {0}")]
    Upstream(String),
}

/// Several per-item failures of one batch call, each tagged with the index
/// of the item that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateError {
    items: Vec<(usize, String)>,
}

impl AggregateError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize, message: impl Into<String>) {
        self.items.push((index, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[(usize, String)] {
        &self.items
    }

    /// `None` when nothing failed.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (index, message)) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "[{}]: {}", index, message)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Errors returned by [`crate::services::GroupService`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroupError {
    #[error("{0}")]
    Validation(String),

    #[error("user is not a member of this group")]
    NoMembership,

    #[error("user has no permission for this action")]
    NoPermission,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Account(String),

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for GroupError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => GroupError::NotFound(msg),
            StoreError::Conflict(msg) => GroupError::Conflict(msg),
            StoreError::Backend(msg) => GroupError::Internal(msg),
        }
    }
}

impl From<AccountError> for GroupError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(msg) => GroupError::NotFound(format!("account not found: {}", msg)),
            AccountError::Upstream(msg) => GroupError::Account(msg),
        }
    }
}

impl From<validator::ValidationErrors> for GroupError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();
        GroupError::Validation(messages.join("; "))
    }
}
