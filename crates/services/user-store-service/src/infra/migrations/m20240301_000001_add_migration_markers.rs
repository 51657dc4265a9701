//! Migration: add the `migrating_from` marker to every record table.
//!
//! A destination record carries the id of its source until the source
//! has been deleted; reconciliation scans for markers left behind.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const TABLES: [(RecordTable, &str); 3] = [
    (RecordTable::Candidates, "idx_candidates_migrating_from"),
    (RecordTable::Employers, "idx_employers_migrating_from"),
    (RecordTable::AdminUsers, "idx_admin_users_migrating_from"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, index) in TABLES {
            manager
                .alter_table(
                    Table::alter()
                        .table(table)
                        .add_column(ColumnDef::new(Marker::MigratingFrom).uuid().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name(index)
                        .table(table)
                        .col(Marker::MigratingFrom)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, index) in TABLES {
            manager
                .drop_index(Index::drop().name(index).table(table).to_owned())
                .await?;

            manager
                .alter_table(
                    Table::alter()
                        .table(table)
                        .drop_column(Marker::MigratingFrom)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum RecordTable {
    Candidates,
    Employers,
    AdminUsers,
}

#[derive(DeriveIden)]
enum Marker {
    MigratingFrom,
}
