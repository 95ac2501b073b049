//! Rendering engine for stored templates.
//!
//! Templates use Handlebars syntax (`{{name}}`). Output is plain text: no
//! HTML escaping is applied, and unknown placeholders render as empty
//! strings.

use std::sync::Arc;

use handlebars::Handlebars;

use crate::error::{TemplateError, TemplateResult};
use crate::models::{RenderedTemplate, Template, TemplateVariables};

/// Compiles template text and substitutes variables into it.
#[derive(Clone)]
pub struct RenderingEngine {
    registry: Arc<Handlebars<'static>>,
}

impl Default for RenderingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderingEngine {
    /// Create an engine with escaping disabled and lenient variable lookup.
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(false);

        Self {
            registry: Arc::new(registry),
        }
    }

    /// Renders subject and body of `template`.
    ///
    /// Both parts must compile; if either fails nothing is returned.
    pub fn render(
        &self,
        template: &Template,
        variables: &TemplateVariables,
    ) -> TemplateResult<RenderedTemplate> {
        let subject = self.render_part("subject", &template.subject, variables)?;
        let body = self.render_part("body", &template.body, variables)?;

        Ok(RenderedTemplate {
            subject,
            body,
            language: template.language.clone(),
            version: template.version_number,
        })
    }

    #[cfg(test)]
    fn render_text(&self, source: &str, variables: &TemplateVariables) -> TemplateResult<String> {
        self.render_part("template", source, variables)
    }

    fn render_part(
        &self,
        part: &str,
        source: &str,
        variables: &TemplateVariables,
    ) -> TemplateResult<String> {
        self.registry
            .render_template(source, variables)
            .map_err(|e| TemplateError::Rendering(format!("{}: {}", part, e)))
    }
}
