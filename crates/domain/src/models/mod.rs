//! Domain models.

pub mod render;
pub mod template;

pub use render::{RenderTemplateRequest, RenderedTemplate, TemplateVariable, TemplateVariables};
pub use template::{
    CreateTemplateRequest, ListTemplatesQuery, Template, TemplateFilter, TemplatePage,
    TemplateVersion, UpdateTemplateRequest,
};
