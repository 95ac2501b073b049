//! Database entity definitions (row mappings).

pub mod template;
pub mod template_version;

pub use template::TemplateEntity;
pub use template_version::TemplateVersionEntity;
