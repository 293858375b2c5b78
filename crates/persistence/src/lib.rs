//! Persistence layer for the group service.
//!
//! This crate contains:
//! - Database connection management and embedded migrations
//! - Entity definitions (database row mappings)
//! - The PostgreSQL `GroupStore` implementation
//! - Query metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use db::{create_pool, run_migrations, DatabaseConfig};
pub use repositories::GroupRepository;
