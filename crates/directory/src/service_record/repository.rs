use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::pagination::{Page, Pagination};
use models::category::CategorySet;
use models::service;

use crate::errors::DirectoryError;

/// Storage for service records.
///
/// Implementations own timestamps and the location touch; callers hand over
/// records that have already been normalized and validated.
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn insert(&self, record: service::Model) -> Result<service::Model, DirectoryError>;
    async fn update(&self, record: service::Model) -> Result<service::Model, DirectoryError>;
    async fn get(&self, id: Uuid) -> Result<Option<service::Model>, DirectoryError>;
    async fn delete(&self, id: Uuid) -> Result<bool, DirectoryError>;
    async fn categories_of(&self, id: Uuid) -> Result<CategorySet, DirectoryError>;
    /// Replace the category links; `category_ids` carries no duplicates.
    async fn set_categories(&self, id: Uuid, category_ids: &[Uuid]) -> Result<CategorySet, DirectoryError>;
    async fn list_by_location(&self, location_id: Uuid, opts: Pagination) -> Result<Page<service::Model>, DirectoryError>;
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmServiceRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl ServiceRepository for SeaOrmServiceRepository {
    async fn insert(&self, record: service::Model) -> Result<service::Model, DirectoryError> {
        crate::db::service_record_service::insert_service(&self.db, record).await
    }

    async fn update(&self, record: service::Model) -> Result<service::Model, DirectoryError> {
        crate::db::service_record_service::update_service(&self.db, record).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<service::Model>, DirectoryError> {
        crate::db::service_record_service::get_service(&self.db, id).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DirectoryError> {
        crate::db::service_record_service::delete_service(&self.db, id).await
    }

    async fn categories_of(&self, id: Uuid) -> Result<CategorySet, DirectoryError> {
        crate::db::service_record_service::list_categories(&self.db, id).await
    }

    async fn set_categories(&self, id: Uuid, category_ids: &[Uuid]) -> Result<CategorySet, DirectoryError> {
        crate::db::service_record_service::replace_categories(&self.db, id, category_ids).await
    }

    async fn list_by_location(&self, location_id: Uuid, opts: Pagination) -> Result<Page<service::Model>, DirectoryError> {
        crate::db::service_record_service::list_services_by_location_paginated(&self.db, location_id, opts).await
    }
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use models::category;

    #[derive(Default)]
    pub struct MockServiceRepository {
        services: Mutex<HashMap<Uuid, service::Model>>,
        categories: Mutex<HashMap<Uuid, category::Model>>,
        links: Mutex<HashMap<Uuid, Vec<Uuid>>>, // key: service_id
        touched: Mutex<Vec<Uuid>>,              // location ids, in touch order
    }

    impl MockServiceRepository {
        pub fn add_category(&self, name: &str) -> category::Model {
            let c = category::Model { id: Uuid::new_v4(), name: name.to_string(), slug: name.to_lowercase().replace(' ', "-") };
            self.categories.lock().unwrap().insert(c.id, c.clone());
            c
        }

        pub fn touched_locations(&self) -> Vec<Uuid> {
            self.touched.lock().unwrap().clone()
        }

        pub fn len(&self) -> usize {
            self.services.lock().unwrap().len()
        }

        fn touch(&self, location_id: Option<Uuid>) {
            if let Some(id) = location_id { self.touched.lock().unwrap().push(id); }
        }
    }

    #[async_trait]
    impl ServiceRepository for MockServiceRepository {
        async fn insert(&self, mut record: service::Model) -> Result<service::Model, DirectoryError> {
            let now = Utc::now().into();
            record.created_at = now;
            record.updated_at = now;
            self.services.lock().unwrap().insert(record.id, record.clone());
            self.touch(record.location_id);
            Ok(record)
        }

        async fn update(&self, mut record: service::Model) -> Result<service::Model, DirectoryError> {
            let mut services = self.services.lock().unwrap();
            if !services.contains_key(&record.id) {
                return Err(DirectoryError::not_found("service"));
            }
            record.updated_at = Utc::now().into();
            services.insert(record.id, record.clone());
            drop(services);
            self.touch(record.location_id);
            Ok(record)
        }

        async fn get(&self, id: Uuid) -> Result<Option<service::Model>, DirectoryError> {
            Ok(self.services.lock().unwrap().get(&id).cloned())
        }

        async fn delete(&self, id: Uuid) -> Result<bool, DirectoryError> {
            let removed = self.services.lock().unwrap().remove(&id);
            self.links.lock().unwrap().remove(&id);
            match removed {
                Some(m) => { self.touch(m.location_id); Ok(true) }
                None => Ok(false),
            }
        }

        async fn categories_of(&self, id: Uuid) -> Result<CategorySet, DirectoryError> {
            let categories = self.categories.lock().unwrap();
            let links = self.links.lock().unwrap();
            let ids = links.get(&id).cloned().unwrap_or_default();
            Ok(ids.iter().filter_map(|c| categories.get(c).cloned()).collect())
        }

        async fn set_categories(&self, id: Uuid, category_ids: &[Uuid]) -> Result<CategorySet, DirectoryError> {
            if !self.services.lock().unwrap().contains_key(&id) {
                return Err(DirectoryError::not_found("service"));
            }
            let categories = self.categories.lock().unwrap();
            let mut set = CategorySet::new();
            for cid in category_ids {
                let c = categories.get(cid).cloned().ok_or_else(|| DirectoryError::not_found("category"))?;
                set.insert(c);
            }
            self.links.lock().unwrap().insert(id, set.ids());
            Ok(set)
        }

        async fn list_by_location(&self, location_id: Uuid, opts: Pagination) -> Result<Page<service::Model>, DirectoryError> {
            let mut rows: Vec<service::Model> = self
                .services
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.location_id == Some(location_id))
                .cloned()
                .collect();
            rows.sort_by_key(|s| s.created_at);
            let total = rows.len() as u64;
            let (_, per_page) = opts.normalize();
            let items = rows.into_iter().skip(opts.offset() as usize).take(per_page as usize).collect();
            Ok(Page::new(items, opts, total))
        }
    }
}
