//! Create `todo` table.
//!
//! Relational replica of every todo; the document store holds the other copy.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Todo::Table)
                    .if_not_exists()
                    .col(string_len(Todo::Id, 64).primary_key())
                    .col(string_len(Todo::Title, 255).not_null())
                    .col(boolean(Todo::Completed).not_null().default(false))
                    .col(timestamp_with_time_zone(Todo::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Todo::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Todo { Table, Id, Title, Completed, CreatedAt }
