//! Template version entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::TemplateVersion;

/// Database row mapping for the template_versions table.
#[derive(Debug, Clone, FromRow)]
pub struct TemplateVersionEntity {
    pub id: Uuid,
    pub template_id: Uuid,
    pub subject: String,
    pub body: String,
    pub version_number: i32,
    pub created_at: DateTime<Utc>,
}

impl From<TemplateVersionEntity> for TemplateVersion {
    fn from(entity: TemplateVersionEntity) -> Self {
        Self {
            id: entity.id,
            template_id: entity.template_id,
            subject: entity.subject,
            body: entity.body,
            version_number: entity.version_number,
            created_at: entity.created_at,
        }
    }
}
