use std::collections::HashSet;

use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::{categories_services, errors, service};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { match *self {} }
}

impl Related<service::Entity> for Entity {
    fn to() -> RelationDef { categories_services::Relation::Service.def() }
    fn via() -> Option<RelationDef> { Some(categories_services::Relation::Category.def().rev()) }
}

impl ActiveModelBehavior for ActiveModel {}

/// API-facing shape of a category.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl Model {
    pub fn to_view(&self) -> CategoryView {
        CategoryView { id: self.id, name: self.name.clone(), slug: self.slug.clone() }
    }
}

pub async fn create<C: ConnectionTrait>(db: &C, name: &str, slug: &str) -> Result<Model, errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("category name required".into())); }
    if slug.trim().is_empty() { return Err(errors::ModelError::Validation("category slug required".into())); }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        slug: Set(slug.trim().to_string()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Categories attached to one service, unique by id, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategorySet {
    items: Vec<Model>,
}

impl CategorySet {
    pub fn new() -> Self { Self::default() }

    /// Adds the category unless one with the same id is already held.
    pub fn insert(&mut self, category: Model) -> bool {
        if self.contains(category.id) { return false; }
        self.items.push(category);
        true
    }

    pub fn contains(&self, id: Uuid) -> bool { self.items.iter().any(|c| c.id == id) }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Model> { self.items.iter() }

    pub fn ids(&self) -> Vec<Uuid> { self.items.iter().map(|c| c.id).collect() }
}

impl FromIterator<Model> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Model>>(iter: I) -> Self {
        let mut set = CategorySet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Model> for CategorySet {
    fn extend<I: IntoIterator<Item = Model>>(&mut self, iter: I) {
        for c in iter { self.insert(c); }
    }
}

/// Drop repeated ids, keeping the first occurrence.
pub fn unique_ids(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
