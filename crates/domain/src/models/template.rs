//! Template domain models and their request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::pagination::{PageMeta, PageRequest};
use uuid::Uuid;
use validator::Validate;

/// Current state of a named template.
///
/// Serializes to the public projection returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub language: String,
    pub version_number: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Immutable snapshot of a template's content at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub id: Uuid,
    #[serde(rename = "templateId")]
    pub template_id: Uuid,
    pub subject: String,
    pub body: String,
    pub version_number: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a template.
///
/// Missing string fields deserialize as empty and fail validation, so absent
/// and blank inputs are reported the same way.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Language is required"))]
    pub language: String,

    #[validate(
        required(message = "Version number is required"),
        range(min = 1, message = "version_number must be a positive integer")
    )]
    pub version_number: Option<i32>,
}

/// Request payload for a partial template update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTemplateRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Subject cannot be empty"))]
    pub subject: Option<String>,

    #[validate(length(min = 1, message = "Body cannot be empty"))]
    pub body: Option<String>,

    #[validate(length(min = 1, message = "Language cannot be empty"))]
    pub language: Option<String>,

    #[validate(range(min = 1, message = "version_number must be a positive integer"))]
    pub version_number: Option<i32>,
}

impl UpdateTemplateRequest {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.subject.is_none()
            && self.body.is_none()
            && self.language.is_none()
            && self.version_number.is_none()
    }

    /// True when the update changes what a version snapshot records.
    pub fn touches_content(&self) -> bool {
        self.subject.is_some() || self.body.is_some() || self.version_number.is_some()
    }

    /// True when the update changes the (name, language) uniqueness key.
    pub fn touches_identity(&self) -> bool {
        self.name.is_some() || self.language.is_some()
    }
}

/// Raw query parameters of the list endpoint.
///
/// Kept as strings so malformed numbers fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTemplatesQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub language: Option<String>,
    pub query: Option<String>,
}

impl ListTemplatesQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_raw(self.page.as_deref(), self.limit.as_deref())
    }

    pub fn filter(&self) -> TemplateFilter {
        TemplateFilter::new(self.language.clone(), self.query.clone())
    }
}

/// Filters applied when listing templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFilter {
    /// Exact language match.
    pub language: Option<String>,
    /// Case-insensitive substring matched against name or subject.
    pub search: Option<String>,
}

impl TemplateFilter {
    /// Builds a filter, treating empty strings as absent.
    pub fn new(language: Option<String>, search: Option<String>) -> Self {
        Self {
            language: language.filter(|l| !l.is_empty()),
            search: search.filter(|s| !s.is_empty()),
        }
    }

    /// Whether `template` passes this filter.
    pub fn matches(&self, template: &Template) -> bool {
        if let Some(language) = &self.language {
            if &template.language != language {
                return false;
            }
        }

        match &self.search {
            Some(search) => {
                let needle = search.to_lowercase();
                template.name.to_lowercase().contains(&needle)
                    || template.subject.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// One page of templates plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatePage {
    pub items: Vec<Template>,
    pub meta: PageMeta,
}
