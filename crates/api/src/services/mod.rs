//! Adapters to external systems: the account and auth services and SMTP.

pub mod account_client;
pub mod auth_client;
pub mod email;

pub use account_client::HttpAccountClient;
pub use auth_client::{HttpAuthClient, SessionValidator};
pub use email::{MailInviteNotifier, SmtpMailSender};
