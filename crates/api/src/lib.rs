//! HTTP surface of the group service.
//!
//! The binary wires these pieces to PostgreSQL and the platform services;
//! integration tests wire them to in-memory collaborators.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod services;
