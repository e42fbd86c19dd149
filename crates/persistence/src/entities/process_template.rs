//! Process template entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::ComplianceProcessTemplate;
use sqlx::types::Json;
use sqlx::FromRow;

/// Database row mapping for the process_templates table.
#[derive(Debug, Clone, FromRow)]
pub struct ProcessTemplateEntity {
    pub id: String,
    pub name: String,
    pub definition: Json<ComplianceProcessTemplate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProcessTemplateEntity> for ComplianceProcessTemplate {
    fn from(entity: ProcessTemplateEntity) -> Self {
        entity.definition.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_domain_returns_definition() {
        let template = ComplianceProcessTemplate::new("dpia", "DPIA");
        let entity = ProcessTemplateEntity {
            id: "dpia".into(),
            name: "DPIA".into(),
            definition: Json(template.clone()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(ComplianceProcessTemplate::from(entity), template);
    }
}
