//! Create `services` table.
//!
//! List-valued attributes (keywords, funding sources, service areas, urls)
//! are stored as JSON arrays.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(uuid(Services::Id).primary_key())
                    .col(uuid_null(Services::LocationId))
                    .col(text_null(Services::Name))
                    .col(text_null(Services::ShortDesc))
                    .col(text_null(Services::Description))
                    .col(text_null(Services::Audience))
                    .col(text_null(Services::Eligibility))
                    .col(text_null(Services::Fees))
                    .col(text_null(Services::HowToApply))
                    .col(text_null(Services::Wait))
                    .col(json_binary_null(Services::Keywords))
                    .col(json_binary_null(Services::FundingSources))
                    .col(json_binary_null(Services::ServiceAreas))
                    .col(json_binary_null(Services::Urls))
                    .col(timestamp_with_time_zone(Services::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Services::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_services_location")
                            .from(Services::Table, Services::LocationId)
                            .to(Locations::Table, Locations::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Services::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Services {
    Table,
    Id,
    LocationId,
    Name,
    ShortDesc,
    Description,
    Audience,
    Eligibility,
    Fees,
    HowToApply,
    Wait,
    Keywords,
    FundingSources,
    ServiceAreas,
    Urls,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Locations { Table, Id }
