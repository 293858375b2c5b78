//! Domain layer for the group service.
//!
//! This crate contains:
//! - Domain models (Group, Membership, InviteLink, Account)
//! - The role/permission table and the invite-link codec
//! - Business logic services and the outbound mail queue
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
