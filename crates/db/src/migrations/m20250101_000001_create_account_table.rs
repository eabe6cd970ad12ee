//! Create account table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Account::Id).string_len(6).not_null().primary_key())
                    .col(ColumnDef::new(Account::Name).string_len(20).not_null())
                    .col(ColumnDef::new(Account::Email).string_len(256).not_null())
                    .col(ColumnDef::new(Account::Country).string_len(2).not_null())
                    .col(ColumnDef::new(Account::PostalCode).string_len(5).not_null())
                    .col(ColumnDef::new(Account::Age).integer())
                    .col(ColumnDef::new(Account::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Account::Place).string_len(256))
                    .col(ColumnDef::new(Account::State).string_len(2))
                    .col(ColumnDef::new(Account::Longitude).double())
                    .col(ColumnDef::new(Account::Latitude).double())
                    .col(ColumnDef::new(Account::SecurityPin).string_len(4))
                    .col(
                        ColumnDef::new(Account::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Account::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_email_unique")
                    .table(Account::Table)
                    .col(Account::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_account_status")
                    .table(Account::Table)
                    .col(Account::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Account {
    Table,
    Id,
    Name,
    Email,
    Country,
    PostalCode,
    Age,
    Status,
    Place,
    State,
    Longitude,
    Latitude,
    SecurityPin,
    CreatedAt,
    UpdatedAt,
}
