//! Shared utilities and common types for the group service.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (invite token generation, secret comparison)
//! - Common validation logic

pub mod crypto;
pub mod validation;
