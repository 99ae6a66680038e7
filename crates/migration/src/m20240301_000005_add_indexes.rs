use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Services: index on location_id
        manager
            .create_index(
                Index::create()
                    .name("idx_services_location")
                    .table(Services::Table)
                    .col(Services::LocationId)
                    .to_owned(),
            )
            .await?;

        // Join table lookups by service
        manager
            .create_index(
                Index::create()
                    .name("idx_categories_services_service")
                    .table(CategoriesServices::Table)
                    .col(CategoriesServices::ServiceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_categories_services_service").table(CategoriesServices::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_services_location").table(Services::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Services { Table, LocationId }

#[derive(DeriveIden)]
enum CategoriesServices { Table, ServiceId }
