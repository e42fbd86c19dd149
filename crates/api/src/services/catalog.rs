//! Template catalog: registered templates backed by the database with an
//! in-memory cache of parsed definitions.

use domain::models::ComplianceProcessTemplate;
use domain::services::WorkflowNavigator;
use persistence::repositories::TemplateRepository;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;

use crate::error::{ApiError, ValidationDetail};

#[derive(Clone)]
pub struct TemplateCatalog {
    repo: TemplateRepository,
    cache: Arc<RwLock<HashMap<String, Arc<ComplianceProcessTemplate>>>>,
}

impl TemplateCatalog {
    pub fn new(repo: TemplateRepository) -> Self {
        Self {
            repo,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check a template before it is accepted for registration.
    ///
    /// Field-level attribute checks come first, then the workflow graph.
    pub fn check(template: &ComplianceProcessTemplate) -> Result<(), ApiError> {
        template.validate()?;

        let issues = WorkflowNavigator::new(&template.workflow_definition).check_definition();
        if issues.is_empty() {
            return Ok(());
        }

        Err(ApiError::InvalidRequest(
            issues
                .into_iter()
                .map(|issue| ValidationDetail {
                    field: "workflow_definition".into(),
                    message: issue.to_string(),
                })
                .collect(),
        ))
    }

    /// Validate, store and cache a template. Re-registering an id replaces it.
    pub async fn register(
        &self,
        template: ComplianceProcessTemplate,
    ) -> Result<Arc<ComplianceProcessTemplate>, ApiError> {
        Self::check(&template)?;
        self.repo.upsert(&template).await?;

        tracing::info!(
            template_id = %template.id,
            fields = template.fields().len(),
            states = template.workflow_definition.states.len(),
            "Registered process template"
        );

        Ok(self.cache(template).await)
    }

    /// Put a template in the cache without storing it.
    pub async fn cache(
        &self,
        template: ComplianceProcessTemplate,
    ) -> Arc<ComplianceProcessTemplate> {
        let template = Arc::new(template);
        self.cache
            .write()
            .await
            .insert(template.id.clone(), template.clone());
        template
    }

    /// Look up a template, loading it from the database on a cache miss.
    pub async fn get(&self, id: &str) -> Result<Option<Arc<ComplianceProcessTemplate>>, ApiError> {
        if let Some(template) = self.cache.read().await.get(id) {
            return Ok(Some(template.clone()));
        }

        match self.repo.find_by_id(id).await? {
            Some(entity) => {
                tracing::debug!(template_id = %id, "Loaded process template from database");
                Ok(Some(self.cache(entity.into()).await))
            }
            None => Ok(None),
        }
    }

    pub async fn require(&self, id: &str) -> Result<Arc<ComplianceProcessTemplate>, ApiError> {
        self.get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Template {} not found", id)))
    }

    pub fn repository(&self) -> &TemplateRepository {
        &self.repo
    }
}
