//! Template repository: the PostgreSQL implementation of the template store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use domain::error::StoreError;
use domain::models::{Template, TemplateFilter, TemplateVersion};
use domain::store::{
    NewTemplate, NewTemplateVersion, StoreResult, TemplateChanges, TemplateStore,
    TemplateTransaction,
};
use shared::pagination::PageRequest;

use crate::entities::{TemplateEntity, TemplateVersionEntity};
use crate::metrics::QueryTimer;

const TEMPLATE_COLUMNS: &str = "id, name, subject, body, language, version_number, created_at";

const FILTER_CLAUSE: &str = r#"
    ($1::text IS NULL OR language = $1)
    AND ($2::text IS NULL OR name ILIKE $2 OR subject ILIKE $2)
"#;

/// Maps a sqlx error onto the store's failure kinds.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StoreError::UniqueViolation(
                db_err
                    .constraint()
                    .unwrap_or("unique constraint")
                    .to_string(),
            ),
            _ => {
                tracing::error!("Database error: {}", db_err);
                StoreError::Database(db_err.to_string())
            }
        },
        sqlx::Error::PoolTimedOut => {
            tracing::warn!("Timed out acquiring a database connection");
            StoreError::Unavailable("timed out acquiring a database connection".into())
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool is closed".into()),
        sqlx::Error::Io(e) => {
            tracing::warn!("Database I/O error: {}", e);
            StoreError::Unavailable(format!("database I/O error: {}", e))
        }
        other => {
            tracing::error!("Database error: {}", other);
            StoreError::Database(other.to_string())
        }
    }
}

/// Escapes LIKE metacharacters so `search` matches literally.
fn escape_like(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn search_pattern(filter: &TemplateFilter) -> Option<String> {
    filter
        .search
        .as_deref()
        .map(|s| format!("%{}%", escape_like(s)))
}

/// Template store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    /// Creates a new PgTemplateStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn count(&self, filter: &TemplateFilter) -> StoreResult<i64> {
        let timer = QueryTimer::new("count_templates");
        let sql = format!("SELECT COUNT(*) FROM templates WHERE {}", FILTER_CLAUSE);
        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(&sql)
            .bind(filter.language.as_deref())
            .bind(search_pattern(filter))
            .fetch_one(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(map_sqlx_error)?.0)
    }

    async fn find_many(
        &self,
        filter: &TemplateFilter,
        page: &PageRequest,
    ) -> StoreResult<Vec<Template>> {
        let timer = QueryTimer::new("list_templates");
        let sql = format!(
            "SELECT {} FROM templates WHERE {} ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
            TEMPLATE_COLUMNS, FILTER_CLAUSE
        );
        let result = sqlx::query_as::<_, TemplateEntity>(&sql)
            .bind(filter.language.as_deref())
            .bind(search_pattern(filter))
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(Template::from)
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Template>> {
        let timer = QueryTimer::new("find_template_by_id");
        let sql = format!("SELECT {} FROM templates WHERE id = $1", TEMPLATE_COLUMNS);
        let result = sqlx::query_as::<_, TemplateEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(map_sqlx_error)?.map(Template::from))
    }

    async fn find_by_name_language(
        &self,
        name: &str,
        language: &str,
    ) -> StoreResult<Option<Template>> {
        let timer = QueryTimer::new("find_template_by_name_language");
        let sql = format!(
            "SELECT {} FROM templates WHERE name = $1 AND language = $2",
            TEMPLATE_COLUMNS
        );
        let result = sqlx::query_as::<_, TemplateEntity>(&sql)
            .bind(name)
            .bind(language)
            .fetch_optional(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(map_sqlx_error)?.map(Template::from))
    }

    async fn list_versions(&self, template_id: Uuid) -> StoreResult<Vec<TemplateVersion>> {
        let timer = QueryTimer::new("list_template_versions");
        let result = sqlx::query_as::<_, TemplateVersionEntity>(
            r#"
            SELECT id, template_id, subject, body, version_number, created_at
            FROM template_versions
            WHERE template_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(TemplateVersion::from)
            .collect())
    }

    async fn begin(&self) -> StoreResult<Box<dyn TemplateTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PgTemplateTransaction { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}

/// One open database transaction. Dropped uncommitted, sqlx rolls it back.
struct PgTemplateTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TemplateTransaction for PgTemplateTransaction {
    async fn find_for_update(&mut self, id: Uuid) -> StoreResult<Option<Template>> {
        let timer = QueryTimer::new("lock_template");
        let sql = format!(
            "SELECT {} FROM templates WHERE id = $1 FOR UPDATE",
            TEMPLATE_COLUMNS
        );
        let result = sqlx::query_as::<_, TemplateEntity>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await;
        timer.finish(&result);
        Ok(result.map_err(map_sqlx_error)?.map(Template::from))
    }

    async fn find_by_name_language(
        &mut self,
        name: &str,
        language: &str,
    ) -> StoreResult<Option<Template>> {
        let timer = QueryTimer::new("find_template_by_name_language");
        let sql = format!(
            "SELECT {} FROM templates WHERE name = $1 AND language = $2",
            TEMPLATE_COLUMNS
        );
        let result = sqlx::query_as::<_, TemplateEntity>(&sql)
            .bind(name)
            .bind(language)
            .fetch_optional(&mut *self.tx)
            .await;
        timer.finish(&result);
        Ok(result.map_err(map_sqlx_error)?.map(Template::from))
    }

    async fn insert_template(&mut self, template: NewTemplate) -> StoreResult<Template> {
        let timer = QueryTimer::new("create_template");
        let sql = format!(
            r#"
            INSERT INTO templates (name, subject, body, language, version_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TEMPLATE_COLUMNS
        );
        let result = sqlx::query_as::<_, TemplateEntity>(&sql)
            .bind(&template.name)
            .bind(&template.subject)
            .bind(&template.body)
            .bind(&template.language)
            .bind(template.version_number)
            .fetch_one(&mut *self.tx)
            .await;
        timer.finish(&result);
        Ok(result.map_err(map_sqlx_error)?.into())
    }

    async fn update_template(
        &mut self,
        id: Uuid,
        changes: TemplateChanges,
    ) -> StoreResult<Template> {
        let timer = QueryTimer::new("update_template");
        let sql = format!(
            r#"
            UPDATE templates SET
                name = COALESCE($2, name),
                subject = COALESCE($3, subject),
                body = COALESCE($4, body),
                language = COALESCE($5, language),
                version_number = COALESCE($6, version_number)
            WHERE id = $1
            RETURNING {}
            "#,
            TEMPLATE_COLUMNS
        );
        let result = sqlx::query_as::<_, TemplateEntity>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.subject)
            .bind(changes.body)
            .bind(changes.language)
            .bind(changes.version_number)
            .fetch_one(&mut *self.tx)
            .await;
        timer.finish(&result);
        Ok(result.map_err(map_sqlx_error)?.into())
    }

    async fn insert_version(
        &mut self,
        version: NewTemplateVersion,
    ) -> StoreResult<TemplateVersion> {
        let timer = QueryTimer::new("create_template_version");
        let result = sqlx::query_as::<_, TemplateVersionEntity>(
            r#"
            INSERT INTO template_versions (template_id, subject, body, version_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, template_id, subject, body, version_number, created_at
            "#,
        )
        .bind(version.template_id)
        .bind(&version.subject)
        .bind(&version.body)
        .bind(version.version_number)
        .fetch_one(&mut *self.tx)
        .await;
        timer.finish(&result);
        Ok(result.map_err(map_sqlx_error)?.into())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let PgTemplateTransaction { tx } = *self;
        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        let PgTemplateTransaction { tx } = *self;
        tx.rollback().await.map_err(map_sqlx_error)
    }
}
