//! Domain layer for the template service.
//!
//! This crate contains:
//! - Domain models (Template, TemplateVersion, render inputs and outputs)
//! - The store seam the persistence layer implements
//! - Business logic services (versioning coordinator, rendering engine)
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{StoreError, TemplateError, TemplateResult};
