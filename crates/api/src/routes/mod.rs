//! HTTP route handlers.

use domain::services::Partial;
use serde::Serialize;

pub mod groups;
pub mod health;
pub mod internal;
pub mod invites;
pub mod membership;

/// Body of a batch call that may have succeeded for only some items.
///
/// The payload lists what succeeded; `error` summarizes the failures.
#[derive(Debug, Serialize)]
pub struct PartialBody<T> {
    #[serde(flatten)]
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<Partial<T>> for PartialBody<T> {
    fn from(partial: Partial<T>) -> Self {
        Self {
            data: partial.value,
            error: partial.errors.map(|errors| errors.to_string()),
        }
    }
}
