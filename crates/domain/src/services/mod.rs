//! Domain services for the group service.
//!
//! [`GroupService`] holds the business rules; the traits in this module are
//! the seams to storage, the account service and outbound mail.

pub mod account;
pub mod group;
pub mod mail_queue;
pub mod memory;
pub mod notifier;
pub mod store;

pub use account::AccountClient;
pub use group::{GroupService, Partial, TokenSource, DEFAULT_LINK_PREFIX, MAX_TOKEN_ATTEMPTS};
pub use mail_queue::{
    mail_queue, DeliveryOutcome, MailError, MailPackage, MailQueue, MailSender, MailWorker,
    MAX_DELIVERY_ATTEMPTS, QUEUE_CAPACITY,
};
pub use memory::{MemoryGroupStore, MockAccountClient};
pub use notifier::{InviteLetter, InviteNotifier, MockInviteNotifier, NotificationResult};
pub use store::GroupStore;
