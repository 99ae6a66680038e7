use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;
use chrono::Utc;
use tracing::{debug, warn};
use models::category::{self, CategorySet};
use models::{categories_services, location, service};
use common::pagination::{Page, Pagination};
use crate::errors::DirectoryError;

fn db_err(e: DbErr) -> DirectoryError { DirectoryError::Db(e.to_string()) }

/// Bump the owning location's `updated_at` alongside a service write.
async fn touch_location<C: ConnectionTrait>(db: &C, location_id: Option<Uuid>, at: DateTimeWithTimeZone) -> Result<(), DirectoryError> {
    let Some(location_id) = location_id else { return Ok(()) };
    if location::touch(db, location_id, at).await? {
        debug!(%location_id, "location_touched");
    } else {
        warn!(%location_id, "location_touch_missed");
    }
    Ok(())
}

/// Insert an already validated service; storage assigns the timestamps.
pub async fn insert_service(db: &DatabaseConnection, mut record: service::Model) -> Result<service::Model, DirectoryError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    record.created_at = now;
    record.updated_at = now;

    let txn = db.begin().await.map_err(db_err)?;
    if let Some(location_id) = record.location_id {
        let exists = location::Entity::find_by_id(location_id).one(&txn).await.map_err(db_err)?;
        if exists.is_none() { return Err(DirectoryError::not_found("location")); }
    }
    let saved = record.into_active_model().reset_all().insert(&txn).await.map_err(db_err)?;
    touch_location(&txn, saved.location_id, now).await?;
    txn.commit().await.map_err(db_err)?;
    Ok(saved)
}

/// Persist every attribute of an already validated service.
pub async fn update_service(db: &DatabaseConnection, mut record: service::Model) -> Result<service::Model, DirectoryError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    record.updated_at = now;
    let id = record.id;

    let txn = db.begin().await.map_err(db_err)?;
    let mut am = record.into_active_model().reset_all();
    am.id = Unchanged(id);
    let updated = am.update(&txn).await.map_err(|e| match e {
        DbErr::RecordNotUpdated => DirectoryError::not_found("service"),
        other => db_err(other),
    })?;
    touch_location(&txn, updated.location_id, now).await?;
    txn.commit().await.map_err(db_err)?;
    Ok(updated)
}

/// Get a service by id.
pub async fn get_service(db: &DatabaseConnection, id: Uuid) -> Result<Option<service::Model>, DirectoryError> {
    let found = service::Entity::find_by_id(id).one(db).await.map_err(db_err)?;
    Ok(found)
}

/// Delete a service and touch its location; returns true if deleted.
pub async fn delete_service(db: &DatabaseConnection, id: Uuid) -> Result<bool, DirectoryError> {
    let txn = db.begin().await.map_err(db_err)?;
    let Some(existing) = service::Entity::find_by_id(id).one(&txn).await.map_err(db_err)? else {
        return Ok(false);
    };
    let res = service::Entity::delete_by_id(id).exec(&txn).await.map_err(db_err)?;
    touch_location(&txn, existing.location_id, Utc::now().into()).await?;
    txn.commit().await.map_err(db_err)?;
    Ok(res.rows_affected > 0)
}

/// Categories linked to a service, ordered by name.
pub async fn list_categories(db: &DatabaseConnection, service_id: Uuid) -> Result<CategorySet, DirectoryError> {
    let svc = service::Entity::find_by_id(service_id)
        .one(db)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DirectoryError::not_found("service"))?;
    let rows = svc
        .find_related(category::Entity)
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(db_err)?;
    Ok(rows.into_iter().collect())
}

/// Replace a service's categories. Ids must already be de-duplicated.
pub async fn replace_categories(db: &DatabaseConnection, service_id: Uuid, category_ids: &[Uuid]) -> Result<CategorySet, DirectoryError> {
    let txn = db.begin().await.map_err(db_err)?;
    if service::Entity::find_by_id(service_id).one(&txn).await.map_err(db_err)?.is_none() {
        return Err(DirectoryError::not_found("service"));
    }

    let found = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids.to_vec()))
        .all(&txn)
        .await
        .map_err(db_err)?;
    // keep the caller's order
    let mut set = CategorySet::new();
    for id in category_ids {
        match found.iter().find(|c| c.id == *id) {
            Some(c) => { set.insert(c.clone()); }
            None => return Err(DirectoryError::not_found("category")),
        }
    }

    categories_services::Entity::delete_many()
        .filter(categories_services::Column::ServiceId.eq(service_id))
        .exec(&txn)
        .await
        .map_err(db_err)?;
    if !set.is_empty() {
        let links = set.ids().into_iter().map(|category_id| categories_services::ActiveModel {
            category_id: Set(category_id),
            service_id: Set(service_id),
        });
        categories_services::Entity::insert_many(links).exec(&txn).await.map_err(db_err)?;
    }
    txn.commit().await.map_err(db_err)?;
    Ok(set)
}

/// List services at a location with pagination, oldest first.
pub async fn list_services_by_location_paginated(
    db: &DatabaseConnection,
    location_id: Uuid,
    opts: Pagination,
) -> Result<Page<service::Model>, DirectoryError> {
    let (page_idx, per_page) = opts.normalize();
    let paginator = service::Entity::find()
        .filter(service::Column::LocationId.eq(location_id))
        .order_by_asc(service::Column::CreatedAt)
        .paginate(db, per_page);
    let total = paginator.num_items().await.map_err(db_err)?;
    let rows = paginator.fetch_page(page_idx).await.map_err(db_err)?;
    Ok(Page::new(rows, opts, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;
    use models::validation::ValidationContext;

    fn draft(location_id: Option<Uuid>, name: &str) -> service::Model {
        let mut m = service::Model::blank(Uuid::new_v4(), location_id, Utc::now().into());
        m.name = Some(name.to_string());
        m.prepare(&ValidationContext::default()).expect("valid draft");
        m
    }

    #[tokio::test]
    async fn service_crud_touches_location() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };

        let loc = location::create(&db, &format!("svc_loc_{}", Uuid::new_v4())).await?;

        let created = insert_service(&db, draft(Some(loc.id), "Meals")).await?;
        let after_insert = location::Entity::find_by_id(loc.id).one(&db).await?.unwrap();
        assert!(after_insert.updated_at >= loc.updated_at);

        let mut changed = created.clone();
        changed.fees = Some("Free".into());
        let updated = update_service(&db, changed).await?;
        assert_eq!(updated.fees.as_deref(), Some("Free"));
        assert!(updated.updated_at >= created.updated_at);
        let after_update = location::Entity::find_by_id(loc.id).one(&db).await?.unwrap();
        assert!(after_update.updated_at >= after_insert.updated_at);

        let page = list_services_by_location_paginated(&db, loc.id, Pagination { page: 1, per_page: 10 }).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, created.id);

        assert!(delete_service(&db, created.id).await?);
        assert!(get_service(&db, created.id).await?.is_none());
        assert!(!delete_service(&db, created.id).await?);

        location::Entity::delete_by_id(loc.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn insert_with_unknown_location_is_not_found() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let err = insert_service(&db, draft(Some(Uuid::new_v4()), "Orphan")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn replace_categories_is_set_like() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };

        let food = category::create(&db, "Food", &format!("food-{}", Uuid::new_v4())).await?;
        let shelter = category::create(&db, "Shelter", &format!("shelter-{}", Uuid::new_v4())).await?;
        let svc = insert_service(&db, draft(None, "Pantry")).await?;

        let set = replace_categories(&db, svc.id, &[food.id, shelter.id]).await?;
        assert_eq!(set.len(), 2);
        let again = replace_categories(&db, svc.id, &[food.id]).await?;
        assert_eq!(again.ids(), vec![food.id]);
        let loaded = list_categories(&db, svc.id).await?;
        assert_eq!(loaded.ids(), vec![food.id]);

        let missing = replace_categories(&db, svc.id, &[Uuid::new_v4()]).await.unwrap_err();
        assert!(matches!(missing, DirectoryError::NotFound(_)));

        delete_service(&db, svc.id).await?;
        category::Entity::delete_by_id(food.id).exec(&db).await?;
        category::Entity::delete_by_id(shelter.id).exec(&db).await?;
        Ok(())
    }
}
