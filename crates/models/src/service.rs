//! The `services` entity: one service offering at a location.
//!
//! Lifecycle of a write: bulk input is assigned through [`ServiceInput`],
//! then [`Model::normalize`] squishes free text, then [`Model::validate`] runs
//! the rule pipeline. Only a record that passes is handed to storage.

use std::ops::{Deref, DerefMut};

use sea_orm::{entity::prelude::*, FromJsonQueryResult};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::category::{CategorySet, CategoryView};
use crate::text::{self, present_list, present_text};
use crate::validation::{self, ValidationContext, ValidationErrors};
use crate::{categories_services, category, location};

/// Ordered list of strings persisted as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn squish_each(&mut self) {
        for item in self.0.iter_mut() {
            *item = text::squish(item);
        }
    }
}

impl Deref for StringList {
    type Target = [String];
    fn deref(&self) -> &[String] { &self.0 }
}

impl DerefMut for StringList {
    fn deref_mut(&mut self) -> &mut [String] { &mut self.0 }
}

impl From<Vec<String>> for StringList {
    fn from(v: Vec<String>) -> Self { Self(v) }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub location_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub short_desc: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub audience: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub eligibility: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub fees: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub how_to_apply: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub wait: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub keywords: Option<StringList>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub funding_sources: Option<StringList>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub service_areas: Option<StringList>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub urls: Option<StringList>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Location }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Location => Entity::belongs_to(location::Entity)
                .from(Column::LocationId)
                .to(location::Column::Id)
                .into(),
        }
    }
}

impl Related<location::Entity> for Entity {
    fn to() -> RelationDef { Relation::Location.def() }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef { categories_services::Relation::Category.def() }
    fn via() -> Option<RelationDef> { Some(categories_services::Relation::Service.def().rev()) }
}

impl ActiveModelBehavior for ActiveModel {}

/// The mass-assignable attributes of a service.
///
/// `None` leaves the current value untouched. Identity, location, categories
/// and timestamps are not part of this type, and unknown keys are rejected
/// when parsing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceInput {
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub eligibility: Option<String>,
    #[serde(default)]
    pub fees: Option<String>,
    #[serde(default)]
    pub funding_sources: Option<Vec<String>>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub how_to_apply: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub service_areas: Option<Vec<String>>,
    #[serde(default)]
    pub short_desc: Option<String>,
    #[serde(default)]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub wait: Option<String>,
}

impl ServiceInput {
    pub fn assign_to(self, m: &mut Model) {
        fn set<T>(slot: &mut Option<T>, v: Option<T>) {
            if let Some(v) = v { *slot = Some(v); }
        }
        set(&mut m.audience, self.audience);
        set(&mut m.description, self.description);
        set(&mut m.eligibility, self.eligibility);
        set(&mut m.fees, self.fees);
        set(&mut m.funding_sources, self.funding_sources.map(StringList));
        set(&mut m.keywords, self.keywords.map(StringList));
        set(&mut m.how_to_apply, self.how_to_apply);
        set(&mut m.name, self.name);
        set(&mut m.service_areas, self.service_areas.map(StringList));
        set(&mut m.short_desc, self.short_desc);
        set(&mut m.urls, self.urls.map(StringList));
        set(&mut m.wait, self.wait);
    }
}

/// A validation rule: runs `check` only when `applies` holds.
struct Rule {
    applies: fn(&Model, &ValidationContext<'_>) -> bool,
    check: fn(&Model, &ValidationContext<'_>, &mut ValidationErrors),
}

fn has_urls(m: &Model, _: &ValidationContext<'_>) -> bool { m.urls.is_some() }

fn check_urls(m: &Model, _: &ValidationContext<'_>, errors: &mut ValidationErrors) {
    validation::validate_urls(m.urls.as_deref().unwrap_or_default(), errors);
}

fn has_areas_and_allow_list(m: &Model, ctx: &ValidationContext<'_>) -> bool {
    m.service_areas.is_some() && !ctx.valid_service_areas.is_empty()
}

fn check_service_areas(m: &Model, ctx: &ValidationContext<'_>, errors: &mut ValidationErrors) {
    validation::validate_service_areas(m.service_areas.as_deref().unwrap_or_default(), ctx, errors);
}

const RULES: &[Rule] = &[
    Rule { applies: has_urls, check: check_urls },
    Rule { applies: has_areas_and_allow_list, check: check_service_areas },
];

impl Model {
    /// A record with no attributes set, as storage would create it.
    pub fn blank(id: Uuid, location_id: Option<Uuid>, now: DateTimeWithTimeZone) -> Self {
        Self {
            id,
            location_id,
            name: None,
            short_desc: None,
            description: None,
            audience: None,
            eligibility: None,
            fees: None,
            how_to_apply: None,
            wait: None,
            keywords: None,
            funding_sources: None,
            service_areas: None,
            urls: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Squish scalar text (blank becomes `None`) and every keyword.
    pub fn normalize(&mut self) {
        for slot in [
            &mut self.audience,
            &mut self.description,
            &mut self.eligibility,
            &mut self.fees,
            &mut self.how_to_apply,
            &mut self.name,
            &mut self.short_desc,
            &mut self.wait,
        ] {
            *slot = slot.take().map(|s| text::squish(&s)).filter(|s| !s.is_empty());
        }
        if let Some(keywords) = self.keywords.as_mut() {
            keywords.squish_each();
        }
    }

    pub fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for rule in RULES.iter().filter(|r| (r.applies)(self, ctx)) {
            (rule.check)(self, ctx, &mut errors);
        }
        errors.into_result()
    }

    /// Normalize then validate, the order every save goes through.
    pub fn prepare(&mut self, ctx: &ValidationContext<'_>) -> Result<(), ValidationErrors> {
        self.normalize();
        self.validate(ctx)
    }

    pub fn to_view(&self, categories: &CategorySet) -> ServiceView {
        ServiceView {
            id: self.id,
            audience: present_text(self.audience.as_ref()),
            description: present_text(self.description.as_ref()),
            eligibility: present_text(self.eligibility.as_ref()),
            fees: present_text(self.fees.as_ref()),
            funding_sources: present_list(self.funding_sources.as_deref()),
            keywords: present_list(self.keywords.as_deref()),
            categories: (!categories.is_empty()).then(|| categories.iter().map(category::Model::to_view).collect()),
            how_to_apply: present_text(self.how_to_apply.as_ref()),
            name: present_text(self.name.as_ref()),
            service_areas: present_list(self.service_areas.as_deref()),
            short_desc: present_text(self.short_desc.as_ref()),
            urls: present_list(self.urls.as_deref()),
            wait: present_text(self.wait.as_ref()),
            updated_at: self.updated_at,
        }
    }
}

/// API-facing projection of a service. Blank attributes are omitted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServiceView {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_to_apply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_areas: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<String>,
    pub updated_at: DateTimeWithTimeZone,
}
