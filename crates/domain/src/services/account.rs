//! Account service port.

use crate::error::AccountError;
use crate::models::Account;

/// Client for the platform's account service.
#[async_trait::async_trait]
pub trait AccountClient: Send + Sync {
    /// Look up an account by email. `Ok(None)` when no such account exists.
    async fn user_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    async fn user_by_id(&self, user_id: i64) -> Result<Account, AccountError>;

    /// Create a placeholder account for someone invited by email.
    async fn create_user(&self, email: &str) -> Result<Account, AccountError>;
}
