//! Secondary indexes. The bus list is always read newest first.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bus_created_at")
                    .table(Bus::Table)
                    .col(Bus::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_bus_created_at").table(Bus::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Bus { Table, CreatedAt }
