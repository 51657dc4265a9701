//! Migration: create the `employers` record table.

use sea_orm_migration::prelude::*;

use super::{document_columns, json_list, record_columns};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut table = Table::create();
        table.table(Employers::Table).if_not_exists();
        record_columns(&mut table);
        document_columns(&mut table);
        table.col(json_list(Employers::Skills));
        table.col(json_list(Employers::CompanyExperience));

        manager.create_table(table.to_owned()).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Employers {
    Table,
    Skills,
    CompanyExperience,
}
