//! Create `locations` table.
//!
//! Services belong to a location; saving a service bumps `updated_at` here.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(uuid(Locations::Id).primary_key())
                    .col(string_len(Locations::Name, 255).not_null())
                    .col(timestamp_with_time_zone(Locations::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Locations::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Locations::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Locations { Table, Id, Name, CreatedAt, UpdatedAt }
