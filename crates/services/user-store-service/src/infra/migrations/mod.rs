//! Database migrations.
//!
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_candidates_table;
mod m20240101_000002_create_employers_table;
mod m20240101_000003_create_admin_users_table;
mod m20240301_000001_add_migration_markers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_candidates_table::Migration),
            Box::new(m20240101_000002_create_employers_table::Migration),
            Box::new(m20240101_000003_create_admin_users_table::Migration),
            Box::new(m20240301_000001_add_migration_markers::Migration),
        ]
    }
}

/// Columns shared by all three record tables.
#[derive(DeriveIden, Clone, Copy)]
enum RecordColumn {
    Id,
    Email,
    PasswordHash,
    Role,
    Name,
    Phone,
    Gender,
    DateOfBirth,
    Summary,
    Blocked,
    Deleted,
    EmailVerified,
    VerificationStatus,
    VerificationToken,
    VerificationTokenExpiresAt,
    ProfileImage,
    CreatedAt,
    UpdatedAt,
}

/// Add identity, credential, profile and lifecycle columns to `table`.
fn record_columns(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(ColumnDef::new(RecordColumn::Id).uuid().not_null().primary_key())
        .col(
            ColumnDef::new(RecordColumn::Email)
                .string_len(255)
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(RecordColumn::PasswordHash).string().not_null())
        .col(ColumnDef::new(RecordColumn::Role).string_len(64).not_null())
        .col(ColumnDef::new(RecordColumn::Name).string().not_null().default(""))
        .col(ColumnDef::new(RecordColumn::Phone).string().not_null().default(""))
        .col(ColumnDef::new(RecordColumn::Gender).string().not_null().default(""))
        .col(ColumnDef::new(RecordColumn::DateOfBirth).date().null())
        .col(ColumnDef::new(RecordColumn::Summary).text().not_null().default(""))
        .col(ColumnDef::new(RecordColumn::Blocked).boolean().not_null().default(false))
        .col(ColumnDef::new(RecordColumn::Deleted).boolean().not_null().default(false))
        .col(
            ColumnDef::new(RecordColumn::EmailVerified)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(
            ColumnDef::new(RecordColumn::VerificationStatus)
                .string_len(32)
                .not_null(),
        )
        .col(ColumnDef::new(RecordColumn::VerificationToken).string().null())
        .col(
            ColumnDef::new(RecordColumn::VerificationTokenExpiresAt)
                .timestamp_with_time_zone()
                .null(),
        )
        .col(ColumnDef::new(RecordColumn::ProfileImage).string().null())
        .col(
            ColumnDef::new(RecordColumn::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(RecordColumn::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
}

/// Identity document columns of candidates and employers.
#[derive(DeriveIden, Clone, Copy)]
enum DocumentColumn {
    IdentityDocument,
    IdentityDocumentStatus,
}

fn document_columns(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(ColumnDef::new(DocumentColumn::IdentityDocument).string().null())
        .col(
            ColumnDef::new(DocumentColumn::IdentityDocumentStatus)
                .string_len(16)
                .not_null()
                .default("Pending"),
        )
}

/// A `jsonb` list column defaulting to `[]`.
fn json_list(column: impl IntoIden) -> ColumnDef {
    ColumnDef::new(column)
        .json_binary()
        .not_null()
        .default(Expr::cust("'[]'::jsonb"))
        .to_owned()
}
