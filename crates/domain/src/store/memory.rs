//! In-process template store.
//!
//! Transactions take an exclusive lock on the whole store and work on a copy
//! of it; commit swaps the copy in, rollback (or drop) discards it. Readers
//! outside a transaction wait for it to finish, so nothing partial is ever
//! observed. Mirrors the constraints of the SQL schema: unique
//! (name, language) and versions referencing an existing template.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared::pagination::PageRequest;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    NewTemplate, NewTemplateVersion, StoreResult, TemplateChanges, TemplateStore,
    TemplateTransaction,
};
use crate::error::StoreError;
use crate::models::{Template, TemplateFilter, TemplateVersion};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    /// Insertion order.
    templates: Vec<Template>,
    /// Insertion order.
    versions: Vec<TemplateVersion>,
}

impl MemoryState {
    fn find(&self, id: Uuid) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    fn find_by_name_language(&self, name: &str, language: &str) -> Option<&Template> {
        self.templates
            .iter()
            .find(|t| t.name == name && t.language == language)
    }

    fn ensure_unique(&self, name: &str, language: &str, except: Option<Uuid>) -> StoreResult<()> {
        match self.find_by_name_language(name, language) {
            Some(existing) if Some(existing.id) != except => Err(StoreError::UniqueViolation(
                "templates_name_language_key".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Matching templates, newest first. Ties keep the later insert first.
    fn newest_first(&self, filter: &TemplateFilter) -> Vec<Template> {
        let mut matching: Vec<Template> = self
            .templates
            .iter()
            .rev()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_version_insert: AtomicBool,
    unavailable: AtomicBool,
}

impl Faults {
    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store marked unavailable".into()))
        } else {
            Ok(())
        }
    }
}

/// Template store kept entirely in memory.
#[derive(Clone, Default)]
pub struct InMemoryTemplateStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl InMemoryTemplateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent ledger insert fail, simulating a fault between
    /// the template write and the version write.
    pub fn fail_version_inserts(&self, fail: bool) {
        self.faults.fail_version_insert.store(fail, Ordering::SeqCst);
    }

    /// Makes every call fail as if the datastore were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of committed templates.
    pub async fn template_count(&self) -> usize {
        self.state.lock().await.templates.len()
    }

    /// Number of committed ledger entries across all templates.
    pub async fn version_count(&self) -> usize {
        self.state.lock().await.versions.len()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn count(&self, filter: &TemplateFilter) -> StoreResult<i64> {
        self.faults.check_available()?;
        let state = self.state.lock().await;
        Ok(state.templates.iter().filter(|t| filter.matches(t)).count() as i64)
    }

    async fn find_many(
        &self,
        filter: &TemplateFilter,
        page: &PageRequest,
    ) -> StoreResult<Vec<Template>> {
        self.faults.check_available()?;
        let state = self.state.lock().await;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(0);

        Ok(state
            .newest_first(filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Template>> {
        self.faults.check_available()?;
        Ok(self.state.lock().await.find(id).cloned())
    }

    async fn find_by_name_language(
        &self,
        name: &str,
        language: &str,
    ) -> StoreResult<Option<Template>> {
        self.faults.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .find_by_name_language(name, language)
            .cloned())
    }

    async fn list_versions(&self, template_id: Uuid) -> StoreResult<Vec<TemplateVersion>> {
        self.faults.check_available()?;
        let state = self.state.lock().await;
        let mut versions: Vec<TemplateVersion> = state
            .versions
            .iter()
            .rev()
            .filter(|v| v.template_id == template_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(versions)
    }

    async fn begin(&self) -> StoreResult<Box<dyn TemplateTransaction>> {
        self.faults.check_available()?;
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();

        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.faults.check_available()
    }
}

/// Transaction over [`InMemoryTemplateStore`].
struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Faults>,
}

#[async_trait]
impl TemplateTransaction for MemoryTransaction {
    async fn find_for_update(&mut self, id: Uuid) -> StoreResult<Option<Template>> {
        Ok(self.working.find(id).cloned())
    }

    async fn find_by_name_language(
        &mut self,
        name: &str,
        language: &str,
    ) -> StoreResult<Option<Template>> {
        Ok(self.working.find_by_name_language(name, language).cloned())
    }

    async fn insert_template(&mut self, template: NewTemplate) -> StoreResult<Template> {
        self.working
            .ensure_unique(&template.name, &template.language, None)?;

        let created = Template {
            id: Uuid::new_v4(),
            name: template.name,
            subject: template.subject,
            body: template.body,
            language: template.language,
            version_number: template.version_number,
            created_at: Utc::now(),
        };
        self.working.templates.push(created.clone());
        Ok(created)
    }

    async fn update_template(
        &mut self,
        id: Uuid,
        changes: TemplateChanges,
    ) -> StoreResult<Template> {
        let mut updated = self
            .working
            .find(id)
            .cloned()
            .ok_or_else(|| StoreError::Database(format!("no template row with id {}", id)))?;
        changes.apply_to(&mut updated);
        self.working
            .ensure_unique(&updated.name, &updated.language, Some(id))?;

        if let Some(slot) = self.working.templates.iter_mut().find(|t| t.id == id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    async fn insert_version(
        &mut self,
        version: NewTemplateVersion,
    ) -> StoreResult<TemplateVersion> {
        if self.faults.fail_version_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected version insert failure".into()));
        }
        if self.working.find(version.template_id).is_none() {
            return Err(StoreError::Database(format!(
                "template_versions.template_id {} has no template",
                version.template_id
            )));
        }

        let created = TemplateVersion {
            id: Uuid::new_v4(),
            template_id: version.template_id,
            subject: version.subject,
            body: version.body,
            version_number: version.version_number,
            created_at: Utc::now(),
        };
        self.working.versions.push(created.clone());
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
