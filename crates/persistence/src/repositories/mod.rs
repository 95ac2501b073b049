//! Repository implementations for database operations.

pub mod template;

pub use template::{map_sqlx_error, PgTemplateStore};
