use std::sync::Arc;
use uuid::Uuid;
use chrono::Utc;
use tracing::{info, instrument, warn};

use common::pagination::{Page, Pagination};
use models::category::{unique_ids, CategorySet};
use models::service::{self, ServiceInput, ServiceView};
use models::validation::ValidationContext;

use crate::errors::DirectoryError;
use crate::service_record::repository::ServiceRepository;

/// Application service encapsulating the service-record write rules.
/// Every save is assigned, normalized and validated here before the
/// repository sees it.
pub struct ServiceDirectory<R: ServiceRepository> {
    repo: Arc<R>,
    valid_service_areas: Vec<String>,
}

impl<R: ServiceRepository> ServiceDirectory<R> {
    pub fn new(repo: Arc<R>, settings: &configs::DirectoryConfig) -> Self {
        Self { repo, valid_service_areas: settings.valid_service_areas.clone() }
    }

    fn context(&self) -> ValidationContext<'_> {
        ValidationContext::new(&self.valid_service_areas)
    }

    fn check(&self, record: &mut service::Model) -> Result<(), DirectoryError> {
        if let Err(errors) = record.prepare(&self.context()) {
            warn!(service_id = %record.id, errors = %errors, "service_rejected");
            return Err(DirectoryError::Invalid(errors));
        }
        Ok(())
    }

    /// Create a service from bulk input. Nothing is stored when validation fails.
    #[instrument(skip(self, input))]
    pub async fn create(&self, location_id: Option<Uuid>, input: ServiceInput) -> Result<service::Model, DirectoryError> {
        let mut record = service::Model::blank(Uuid::new_v4(), location_id, Utc::now().into());
        input.assign_to(&mut record);
        self.check(&mut record)?;
        let saved = self.repo.insert(record).await?;
        info!(service_id = %saved.id, "service_created");
        Ok(saved)
    }

    /// Apply bulk input to an existing service.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: ServiceInput) -> Result<service::Model, DirectoryError> {
        let mut record = self.repo.get(id).await?.ok_or_else(|| DirectoryError::not_found("service"))?;
        input.assign_to(&mut record);
        self.check(&mut record)?;
        let saved = self.repo.update(record).await?;
        info!(service_id = %saved.id, "service_updated");
        Ok(saved)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<service::Model>, DirectoryError> { self.repo.get(id).await }

    /// API-facing projection, including categories.
    pub async fn view(&self, id: Uuid) -> Result<Option<ServiceView>, DirectoryError> {
        let Some(record) = self.repo.get(id).await? else { return Ok(None) };
        let categories = self.repo.categories_of(id).await?;
        Ok(Some(record.to_view(&categories)))
    }

    /// Replace the service's categories; repeated ids collapse to one link.
    #[instrument(skip(self, category_ids))]
    pub async fn assign_categories(&self, id: Uuid, category_ids: Vec<Uuid>) -> Result<CategorySet, DirectoryError> {
        let ids = unique_ids(category_ids);
        let set = self.repo.set_categories(id, &ids).await?;
        info!(service_id = %id, count = set.len(), "service_categories_assigned");
        Ok(set)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, DirectoryError> {
        let deleted = self.repo.delete(id).await?;
        if deleted { info!(service_id = %id, "service_deleted"); }
        Ok(deleted)
    }

    pub async fn list_by_location(&self, location_id: Uuid, opts: Pagination) -> Result<Page<service::Model>, DirectoryError> {
        self.repo.list_by_location(location_id, opts).await
    }

    /// Projections for one page of a location's services.
    pub async fn list_views_by_location(&self, location_id: Uuid, opts: Pagination) -> Result<Page<ServiceView>, DirectoryError> {
        let page = self.repo.list_by_location(location_id, opts).await?;
        let mut views = Vec::with_capacity(page.items.len());
        for record in &page.items {
            let categories = self.repo.categories_of(record.id).await?;
            views.push(record.to_view(&categories));
        }
        Ok(Page { items: views, page: page.page, per_page: page.per_page, total: page.total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service_record::repository::mock::MockServiceRepository;
    use models::validation::SERVICE_AREAS_MESSAGE;

    fn directory(areas: &[&str]) -> (ServiceDirectory<MockServiceRepository>, Arc<MockServiceRepository>) {
        let repo = Arc::new(MockServiceRepository::default());
        let settings = configs::DirectoryConfig { valid_service_areas: areas.iter().map(|s| s.to_string()).collect() };
        (ServiceDirectory::new(repo.clone(), &settings), repo)
    }

    fn input(json: &str) -> ServiceInput { serde_json::from_str(json).unwrap() }

    #[tokio::test]
    async fn create_normalizes_and_touches_location() {
        let (dir, repo) = directory(&["Springfield"]);
        let location_id = Uuid::new_v4();
        let created = dir
            .create(Some(location_id), input(r#"{"name": "  Hot   Meals ", "keywords": [" soup  kitchen "], "service_areas": ["Springfield"]}"#))
            .await
            .unwrap();
        assert_eq!(created.name.as_deref(), Some("Hot Meals"));
        assert_eq!(created.keywords.as_deref(), Some(&["soup kitchen".to_string()][..]));
        assert_eq!(repo.touched_locations(), vec![location_id]);
    }

    #[tokio::test]
    async fn invalid_input_is_not_stored() {
        let (dir, repo) = directory(&["Springfield", "Shelbyville"]);
        let err = dir
            .create(None, input(r#"{"urls": ["http://example.com", "https://a.b.co/path?x=1", "ftp://bad"], "service_areas": ["Ogdenville"]}"#))
            .await
            .unwrap_err();
        let errors = err.validation_errors().expect("validation failure");
        assert_eq!(errors.messages_for("urls"), vec!["ftp://bad is not a valid URL"]);
        assert_eq!(errors.messages_for("service_areas"), vec![SERVICE_AREAS_MESSAGE.to_string()]);
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn missing_allow_list_accepts_any_area() {
        let (dir, _) = directory(&[]);
        let created = dir.create(None, input(r#"{"service_areas": ["Ogdenville"]}"#)).await.unwrap();
        assert_eq!(created.service_areas.as_deref(), Some(&["Ogdenville".to_string()][..]));
    }

    #[tokio::test]
    async fn update_keeps_untouched_fields_and_revalidates() {
        let (dir, _) = directory(&[]);
        let created = dir.create(None, input(r#"{"name": "Meals", "fees": "Free"}"#)).await.unwrap();

        let updated = dir.update(created.id, input(r#"{"wait": " 2   weeks "}"#)).await.unwrap();
        assert_eq!(updated.fees.as_deref(), Some("Free"));
        assert_eq!(updated.wait.as_deref(), Some("2 weeks"));

        let err = dir.update(created.id, input(r#"{"urls": ["not a url"]}"#)).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Invalid(_)));
        let stored = dir.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.urls, None);

        let missing = dir.update(Uuid::new_v4(), ServiceInput::default()).await.unwrap_err();
        assert!(matches!(missing, DirectoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_categories_collapse() {
        let (dir, repo) = directory(&[]);
        let food = repo.add_category("Food");
        let created = dir.create(None, input(r#"{"name": "Pantry"}"#)).await.unwrap();

        let set = dir.assign_categories(created.id, vec![food.id, food.id]).await.unwrap();
        assert_eq!(set.ids(), vec![food.id]);

        let view = serde_json::to_value(dir.view(created.id).await.unwrap().unwrap()).unwrap();
        assert_eq!(view["categories"].as_array().unwrap().len(), 1);
        assert_eq!(view["name"], "Pantry");
    }

    #[tokio::test]
    async fn blank_service_view_has_only_id_and_updated_at() {
        let (dir, _) = directory(&[]);
        let created = dir.create(None, input(r#"{"name": "", "description": "   ", "keywords": []}"#)).await.unwrap();
        let view = serde_json::to_value(dir.view(created.id).await.unwrap().unwrap()).unwrap();
        let mut keys: Vec<String> = view.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["id", "updated_at"]);
    }

    #[tokio::test]
    async fn delete_and_list_by_location() {
        let (dir, repo) = directory(&[]);
        let loc = Uuid::new_v4();
        let a = dir.create(Some(loc), input(r#"{"name": "A"}"#)).await.unwrap();
        let _b = dir.create(Some(loc), input(r#"{"name": "B"}"#)).await.unwrap();
        let _elsewhere = dir.create(Some(Uuid::new_v4()), input(r#"{"name": "C"}"#)).await.unwrap();

        let page = dir.list_views_by_location(loc, Pagination { page: 1, per_page: 1 }).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert!(page.has_next());

        assert!(dir.delete(a.id).await.unwrap());
        assert!(!dir.delete(a.id).await.unwrap());
        assert!(dir.view(a.id).await.unwrap().is_none());
        assert_eq!(repo.touched_locations().iter().filter(|l| **l == loc).count(), 3);
    }
}
