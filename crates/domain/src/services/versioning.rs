//! Versioning coordinator for templates.
//!
//! Every create, and every update that touches content, writes the template
//! row and one ledger entry in the same transaction. Validation and
//! uniqueness are checked before the first write.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use shared::pagination::{PageMeta, PageRequest};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::rendering::RenderingEngine;
use crate::error::{TemplateError, TemplateResult};
use crate::models::{
    CreateTemplateRequest, RenderedTemplate, Template, TemplateFilter, TemplatePage,
    TemplateVariables, TemplateVersion, UpdateTemplateRequest,
};
use crate::store::{
    self, NewTemplate, NewTemplateVersion, TemplateChanges, TemplateStore, TemplateTransaction,
};

/// How caller-supplied version numbers are treated on update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPolicy {
    /// Accept any positive version number, including repeats and decreases.
    #[default]
    Permissive,
    /// Require increasing version numbers and assign `current + 1` when
    /// content changes without one.
    Monotonic,
}

impl VersionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionPolicy::Permissive => "permissive",
            VersionPolicy::Monotonic => "monotonic",
        }
    }

    /// Version number to store for an update, or `None` to leave it as is.
    pub fn resolve(
        &self,
        current: i32,
        requested: Option<i32>,
        content_changed: bool,
    ) -> TemplateResult<Option<i32>> {
        match self {
            VersionPolicy::Permissive => Ok(requested),
            VersionPolicy::Monotonic => match requested {
                Some(requested) if requested <= current => Err(TemplateError::Validation(
                    format!(
                        "version_number must be greater than the current version {}",
                        current
                    ),
                )),
                Some(requested) => Ok(Some(requested)),
                None if content_changed => current.checked_add(1).map(Some).ok_or_else(|| {
                    TemplateError::Validation("version_number cannot be incremented".into())
                }),
                None => Ok(None),
            },
        }
    }
}

impl FromStr for VersionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permissive" => Ok(VersionPolicy::Permissive),
            "monotonic" => Ok(VersionPolicy::Monotonic),
            _ => Err(format!("Invalid version policy: {}", s)),
        }
    }
}

impl fmt::Display for VersionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses a template id from a path segment.
///
/// An empty id is a validation failure; anything else that is not a UUID
/// cannot name a stored template and is reported as not found.
pub fn parse_template_id(raw: &str) -> TemplateResult<Uuid> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TemplateError::Validation("Template id is required".into()));
    }
    Uuid::parse_str(trimmed).map_err(|_| TemplateError::NotFound(trimmed.to_string()))
}

/// Template operations over an injected store.
#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn TemplateStore>,
    engine: RenderingEngine,
    policy: VersionPolicy,
}

impl TemplateService {
    /// Creates a new TemplateService over `store`.
    pub fn new(store: Arc<dyn TemplateStore>, policy: VersionPolicy) -> Self {
        Self {
            store,
            engine: RenderingEngine::new(),
            policy,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    pub fn policy(&self) -> VersionPolicy {
        self.policy
    }

    /// Create a template and its first ledger entry.
    pub async fn create_template(&self, request: CreateTemplateRequest) -> TemplateResult<Template> {
        request.validate()?;
        let version_number = request
            .version_number
            .ok_or_else(|| TemplateError::Validation("Version number is required".into()))?;

        let new = NewTemplate {
            name: request.name,
            subject: request.subject,
            body: request.body,
            language: request.language,
            version_number,
        };

        let mut tx = self.store.begin().await?;
        let outcome = create_in(tx.as_mut(), new).await;
        let template = store::complete(tx, outcome).await?;

        info!(
            template_id = %template.id,
            name = %template.name,
            language = %template.language,
            version_number = template.version_number,
            "Template created"
        );

        Ok(template)
    }

    /// Apply a partial update, recording a ledger entry when content changes.
    pub async fn update_template(
        &self,
        id: &str,
        request: UpdateTemplateRequest,
    ) -> TemplateResult<Template> {
        let id = parse_template_id(id)?;
        if request.is_empty() {
            return Err(TemplateError::Validation(
                "At least one field must be provided".into(),
            ));
        }
        request.validate()?;

        let mut tx = self.store.begin().await?;
        let outcome = update_in(tx.as_mut(), id, request, self.policy).await;
        let (template, versioned) = store::complete(tx, outcome).await?;

        info!(
            template_id = %template.id,
            version_number = template.version_number,
            versioned,
            "Template updated"
        );

        Ok(template)
    }

    /// Get a template by id.
    pub async fn get_template(&self, id: &str) -> TemplateResult<Template> {
        let id = parse_template_id(id)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    /// List templates matching `filter`, newest first.
    pub async fn list_templates(
        &self,
        filter: TemplateFilter,
        page: PageRequest,
    ) -> TemplateResult<TemplatePage> {
        let total = self.store.count(&filter).await?;
        let items = self.store.find_many(&filter, &page).await?;

        Ok(TemplatePage {
            items,
            meta: PageMeta::new(total, &page),
        })
    }

    /// Ledger entries of a template, newest first.
    pub async fn list_template_versions(&self, id: &str) -> TemplateResult<Vec<TemplateVersion>> {
        let template = self.get_template(id).await?;
        Ok(self.store.list_versions(template.id).await?)
    }

    /// Render the current state of a template against `variables`.
    pub async fn render_template(
        &self,
        id: &str,
        variables: &TemplateVariables,
    ) -> TemplateResult<RenderedTemplate> {
        let template = self.get_template(id).await?;
        self.engine.render(&template, variables)
    }
}

async fn create_in(tx: &mut dyn TemplateTransaction, new: NewTemplate) -> TemplateResult<Template> {
    if tx
        .find_by_name_language(&new.name, &new.language)
        .await?
        .is_some()
    {
        return Err(TemplateError::Conflict(
            "Template with this name and language already exists".into(),
        ));
    }

    let template = tx.insert_template(new).await?;
    tx.insert_version(NewTemplateVersion::of(&template)).await?;
    Ok(template)
}

/// Returns the updated row and whether a ledger entry was written.
async fn update_in(
    tx: &mut dyn TemplateTransaction,
    id: Uuid,
    request: UpdateTemplateRequest,
    policy: VersionPolicy,
) -> TemplateResult<(Template, bool)> {
    let current = tx
        .find_for_update(id)
        .await?
        .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;

    if request.touches_identity() {
        let name = request.name.as_deref().unwrap_or(&current.name);
        let language = request.language.as_deref().unwrap_or(&current.language);
        if let Some(existing) = tx.find_by_name_language(name, language).await? {
            if existing.id != current.id {
                return Err(TemplateError::Conflict(
                    "Template with this name and language already exists".into(),
                ));
            }
        }
    }

    let content_changed = request.touches_content();
    let version_number = policy.resolve(
        current.version_number,
        request.version_number,
        content_changed,
    )?;

    let changes = TemplateChanges {
        name: request.name,
        subject: request.subject,
        body: request.body,
        language: request.language,
        version_number,
    };
    let snapshot = changes.snapshot_of(&current);

    let updated = tx.update_template(id, changes).await?;
    if content_changed {
        tx.insert_version(snapshot).await?;
    }

    Ok((updated, content_changed))
}
