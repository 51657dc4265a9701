//! Migration: create the `candidates` record table.

use sea_orm_migration::prelude::*;

use super::{document_columns, json_list, record_columns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table.table(Candidates::Table).if_not_exists();
        record_columns(&mut table);
        document_columns(&mut table);
        table.col(json_list(Candidates::Education));
        table.col(json_list(Candidates::Experience));

        manager.create_table(table.to_owned()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Candidates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Candidates {
    Table,
    Education,
    Experience,
}
