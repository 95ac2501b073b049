//! Template entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::Template;

/// Database row mapping for the templates table.
#[derive(Debug, Clone, FromRow)]
pub struct TemplateEntity {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub language: String,
    pub version_number: i32,
    pub created_at: DateTime<Utc>,
}

impl From<TemplateEntity> for Template {
    fn from(entity: TemplateEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            subject: entity.subject,
            body: entity.body,
            language: entity.language,
            version_number: entity.version_number,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_to_domain() {
        let entity = TemplateEntity {
            id: Uuid::new_v4(),
            name: "password-reset".to_string(),
            subject: "Reset your password".to_string(),
            body: "Use code {{code}}".to_string(),
            language: "en".to_string(),
            version_number: 3,
            created_at: Utc::now(),
        };

        let template: Template = entity.clone().into();
        assert_eq!(template.id, entity.id);
        assert_eq!(template.name, "password-reset");
        assert_eq!(template.body, "Use code {{code}}");
        assert_eq!(template.version_number, 3);
        assert_eq!(template.created_at, entity.created_at);
    }
}
