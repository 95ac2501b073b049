//! Domain services for the template service.
//!
//! Services contain business logic that operates on domain models.

pub mod rendering;
pub mod versioning;

pub use rendering::RenderingEngine;
pub use versioning::{parse_template_id, TemplateService, VersionPolicy};
