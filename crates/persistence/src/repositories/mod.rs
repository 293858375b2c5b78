//! Repository implementations for database operations.

pub mod group;

pub use group::{store_error, GroupRepository};
