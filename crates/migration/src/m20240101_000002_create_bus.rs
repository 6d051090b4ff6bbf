//! Create `bus` table.
//! `stops` holds a JSON array of stop names; `image_url` is either the
//! placeholder asset or a public URL into the upload store.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bus::Table)
                    .if_not_exists()
                    .col(uuid(Bus::Id).primary_key())
                    .col(string_len(Bus::Name, 255).not_null())
                    .col(string_len(Bus::Route, 255).not_null())
                    .col(string_len(Bus::ImageUrl, 1024).not_null())
                    .col(text(Bus::Stops).not_null())
                    .col(string_len(Bus::Status, 16).not_null())
                    .col(string_len(Bus::Schedule, 255).not_null())
                    .col(string_len(Bus::Fare, 64).not_null())
                    .col(timestamp_with_time_zone(Bus::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Bus::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Bus::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Bus {
    Table,
    Id,
    Name,
    Route,
    ImageUrl,
    Stops,
    Status,
    Schedule,
    Fare,
    CreatedAt,
    UpdatedAt,
}
