//! Shared utilities and common types for the template service.
//!
//! This crate provides common functionality used across all other crates:
//! - Page/limit clamping and page metadata for list endpoints
//! - Validation error formatting

pub mod pagination;
pub mod validation;
