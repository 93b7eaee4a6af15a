//! Initial schema.
//!
//! - `users`: identities known to the HTTP layer
//! - `ledgers`: shared bookkeeping workspaces
//! - `ledger_memberships`: (ledger, user, role) triples
//! - `invitations`: redeemable join tokens with usage counters

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
}

#[derive(Iden)]
enum Ledgers {
    Table,
    Id,
    Name,
    Description,
    Currency,
    CreatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum LedgerMemberships {
    Table,
    LedgerId,
    UserId,
    Role,
    JoinedAt,
    InvitedBy,
    IsDefault,
}

#[derive(Iden)]
enum Invitations {
    Table,
    Token,
    LedgerId,
    DefaultRole,
    MaxUses,
    UsedCount,
    ExpiresAt,
    Revoked,
    CreatedBy,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ledgers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Ledgers::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Ledgers::Name).string().not_null())
                    .col(ColumnDef::new(Ledgers::Description).string().null())
                    .col(
                        ColumnDef::new(Ledgers::Currency)
                            .string()
                            .not_null()
                            .default("CNY"),
                    )
                    .col(ColumnDef::new(Ledgers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Ledgers::DeletedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerMemberships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LedgerMemberships::LedgerId).string().not_null())
                    .col(ColumnDef::new(LedgerMemberships::UserId).string().not_null())
                    .col(ColumnDef::new(LedgerMemberships::Role).string().not_null())
                    .col(
                        ColumnDef::new(LedgerMemberships::JoinedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerMemberships::InvitedBy).string().null())
                    .col(
                        ColumnDef::new(LedgerMemberships::IsDefault)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .primary_key(
                        Index::create()
                            .col(LedgerMemberships::LedgerId)
                            .col(LedgerMemberships::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_memberships-ledger_id")
                            .from(LedgerMemberships::Table, LedgerMemberships::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_memberships-user_id")
                    .table(LedgerMemberships::Table)
                    .col(LedgerMemberships::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invitations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invitations::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Invitations::LedgerId).string().not_null())
                    .col(ColumnDef::new(Invitations::DefaultRole).string().not_null())
                    .col(
                        ColumnDef::new(Invitations::MaxUses)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Invitations::UsedCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Invitations::ExpiresAt).timestamp().null())
                    .col(
                        ColumnDef::new(Invitations::Revoked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Invitations::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Invitations::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invitations-ledger_id")
                            .from(Invitations::Table, Invitations::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invitations-ledger_id")
                    .table(Invitations::Table)
                    .col(Invitations::LedgerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Invitations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerMemberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ledgers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
