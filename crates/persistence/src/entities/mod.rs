//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod group;
pub mod invite_link;
pub mod membership;

pub use group::{GroupEntity, GroupPreviewEntity};
pub use invite_link::InviteLinkEntity;
pub use membership::MembershipEntity;
