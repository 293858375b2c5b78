//! Invite letter notifications.
//!
//! The group service hands a finished letter to an [`InviteNotifier`]; the
//! notifier decides how it reaches the recipient.

use std::sync::{Arc, Mutex};

/// Everything needed to render an invite letter.
#[derive(Debug, Clone, PartialEq)]
pub struct InviteLetter {
    pub recipient: String,
    pub admin_name: String,
    pub admin_email: String,
    pub group_title: String,
    pub link: String,
}

/// Result of handing a letter to the notifier.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationResult {
    /// Letter accepted for delivery.
    Queued,
    /// Letter could not be accepted.
    Failed(String),
}

#[async_trait::async_trait]
pub trait InviteNotifier: Send + Sync {
    async fn send_invite(&self, letter: InviteLetter) -> NotificationResult;
}

/// Mock notifier for development and tests.
///
/// Records letters instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct MockInviteNotifier {
    letters: Arc<Mutex<Vec<InviteLetter>>>,
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
}

impl MockInviteNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Letters accepted so far.
    pub fn letters(&self) -> Vec<InviteLetter> {
        self.letters
            .lock()
            .map(|letters| letters.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl InviteNotifier for MockInviteNotifier {
    async fn send_invite(&self, letter: InviteLetter) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(recipient = %letter.recipient, "Mock notifier simulating failure");
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            recipient = %letter.recipient,
            group_title = %letter.group_title,
            "Mock: Would send invite letter"
        );
        match self.letters.lock() {
            Ok(mut letters) => {
                letters.push(letter);
                NotificationResult::Queued
            }
            Err(_) => NotificationResult::Failed("letter log poisoned".to_string()),
        }
    }
}
