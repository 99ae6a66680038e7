//! Create `categories_services` join table.
//!
//! The composite primary key keeps each (category, service) pair unique.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CategoriesServices::Table)
                    .if_not_exists()
                    .col(uuid(CategoriesServices::CategoryId).not_null())
                    .col(uuid(CategoriesServices::ServiceId).not_null())
                    .primary_key(
                        Index::create()
                            .col(CategoriesServices::CategoryId)
                            .col(CategoriesServices::ServiceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_services_category")
                            .from(CategoriesServices::Table, CategoriesServices::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_services_service")
                            .from(CategoriesServices::Table, CategoriesServices::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CategoriesServices::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CategoriesServices { Table, CategoryId, ServiceId }

#[derive(DeriveIden)]
enum Categories { Table, Id }

#[derive(DeriveIden)]
enum Services { Table, Id }
