//! At most one `owner` membership per ledger.
//!
//! A partial unique index; sea-query has no portable builder for the
//! `WHERE` clause so the statement is issued verbatim.

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEX_NAME: &str = "idx-ledger_memberships-single_owner";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{INDEX_NAME}\" \
                 ON ledger_memberships (ledger_id) WHERE role = 'owner'"
            ))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(INDEX_NAME)
                    .table(Alias::new("ledger_memberships"))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
