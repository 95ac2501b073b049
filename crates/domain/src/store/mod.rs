//! Datastore seam for templates and their version ledger.
//!
//! The coordinator only talks to these traits. `persistence` provides the
//! PostgreSQL implementation and [`memory`] an in-process one used by tests.

pub mod memory;

use async_trait::async_trait;
use shared::pagination::PageRequest;
use uuid::Uuid;

use crate::error::{StoreError, TemplateResult};
use crate::models::{Template, TemplateFilter, TemplateVersion};

pub use memory::InMemoryTemplateStore;

/// Result type for datastore calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Values for a new template row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    pub name: String,
    pub subject: String,
    pub body: String,
    pub language: String,
    pub version_number: i32,
}

/// Partial update of a template row; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateChanges {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub language: Option<String>,
    pub version_number: Option<i32>,
}

impl TemplateChanges {
    /// Applies the changes to `template` in place.
    pub fn apply_to(&self, template: &mut Template) {
        if let Some(name) = &self.name {
            template.name = name.clone();
        }
        if let Some(subject) = &self.subject {
            template.subject = subject.clone();
        }
        if let Some(body) = &self.body {
            template.body = body.clone();
        }
        if let Some(language) = &self.language {
            template.language = language.clone();
        }
        if let Some(version_number) = self.version_number {
            template.version_number = version_number;
        }
    }

    /// Complete snapshot for the ledger: new value where supplied, otherwise
    /// the value stored before the update.
    pub fn snapshot_of(&self, before: &Template) -> NewTemplateVersion {
        NewTemplateVersion {
            template_id: before.id,
            subject: self.subject.clone().unwrap_or_else(|| before.subject.clone()),
            body: self.body.clone().unwrap_or_else(|| before.body.clone()),
            version_number: self.version_number.unwrap_or(before.version_number),
        }
    }
}

/// Values for a new ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplateVersion {
    pub template_id: Uuid,
    pub subject: String,
    pub body: String,
    pub version_number: i32,
}

impl NewTemplateVersion {
    /// Snapshot of a template exactly as stored.
    pub fn of(template: &Template) -> Self {
        Self {
            template_id: template.id,
            subject: template.subject.clone(),
            body: template.body.clone(),
            version_number: template.version_number,
        }
    }
}

/// Read access plus transaction creation.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Number of templates matching `filter`.
    async fn count(&self, filter: &TemplateFilter) -> StoreResult<i64>;

    /// One page of templates matching `filter`, newest first.
    async fn find_many(
        &self,
        filter: &TemplateFilter,
        page: &PageRequest,
    ) -> StoreResult<Vec<Template>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Template>>;

    async fn find_by_name_language(
        &self,
        name: &str,
        language: &str,
    ) -> StoreResult<Option<Template>>;

    /// Ledger entries for a template, newest first.
    async fn list_versions(&self, template_id: Uuid) -> StoreResult<Vec<TemplateVersion>>;

    /// Opens a transaction. Dropping it without commit rolls it back.
    async fn begin(&self) -> StoreResult<Box<dyn TemplateTransaction>>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> StoreResult<()>;
}

/// Write access scoped to one transaction.
#[async_trait]
pub trait TemplateTransaction: Send {
    /// Reads a template and locks it until the transaction ends.
    async fn find_for_update(&mut self, id: Uuid) -> StoreResult<Option<Template>>;

    async fn find_by_name_language(
        &mut self,
        name: &str,
        language: &str,
    ) -> StoreResult<Option<Template>>;

    async fn insert_template(&mut self, template: NewTemplate) -> StoreResult<Template>;

    async fn update_template(
        &mut self,
        id: Uuid,
        changes: TemplateChanges,
    ) -> StoreResult<Template>;

    async fn insert_version(&mut self, version: NewTemplateVersion)
        -> StoreResult<TemplateVersion>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Ends a transaction according to the outcome of the work done inside it.
///
/// Commits on `Ok`, rolls back on `Err`. The transaction handle is consumed
/// on every path. A failed rollback is logged and the original error wins.
pub async fn complete<T>(
    tx: Box<dyn TemplateTransaction>,
    outcome: TemplateResult<T>,
) -> TemplateResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stored() -> Template {
        Template {
            id: Uuid::new_v4(),
            name: "welcome".into(),
            subject: "Old subject".into(),
            body: "Old body".into(),
            language: "en".into(),
            version_number: 3,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_falls_back_to_stored_values() {
        let before = stored();
        let changes = TemplateChanges {
            subject: Some("New subject".into()),
            ..Default::default()
        };

        let snapshot = changes.snapshot_of(&before);
        assert_eq!(snapshot.template_id, before.id);
        assert_eq!(snapshot.subject, "New subject");
        assert_eq!(snapshot.body, "Old body");
        assert_eq!(snapshot.version_number, 3);
    }

    #[test]
    fn test_snapshot_uses_all_supplied_values() {
        let before = stored();
        let changes = TemplateChanges {
            subject: Some("S".into()),
            body: Some("B".into()),
            version_number: Some(9),
            ..Default::default()
        };

        let snapshot = changes.snapshot_of(&before);
        assert_eq!(snapshot.subject, "S");
        assert_eq!(snapshot.body, "B");
        assert_eq!(snapshot.version_number, 9);
    }

    #[test]
    fn test_apply_to_only_touches_supplied_fields() {
        let mut template = stored();
        let original = template.clone();

        TemplateChanges {
            name: Some("renamed".into()),
            ..Default::default()
        }
        .apply_to(&mut template);

        assert_eq!(template.name, "renamed");
        assert_eq!(template.subject, original.subject);
        assert_eq!(template.language, original.language);
        assert_eq!(template.version_number, original.version_number);
        assert_eq!(template.created_at, original.created_at);
    }

    #[test]
    fn test_new_version_of_template() {
        let template = stored();
        let version = NewTemplateVersion::of(&template);
        assert_eq!(version.template_id, template.id);
        assert_eq!(version.subject, template.subject);
        assert_eq!(version.body, template.body);
        assert_eq!(version.version_number, template.version_number);
    }
}
