//! Persistence layer for the template service.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - The PostgreSQL implementation of the domain template store
//! - SQL migrations, embedded by the binary at startup

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use repositories::PgTemplateStore;
