//! Persistence for memberships and invitations.
//!
//! Store operations never open their own transaction: they run on whatever
//! connection or transaction the caller hands them, so a service method can
//! combine several of them atomically.

use sea_orm::{ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter, SqlErr, sea_query::Expr};

use crate::{EngineError, ResultEngine, ledger};

mod invitations;
mod memberships;

pub use invitations::{InvitationStore, MAX_TOKEN_ATTEMPTS};
pub use memberships::MembershipStore;

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Turn a unique-constraint failure into a `Conflict`, pass everything else through.
pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> EngineError {
    if is_unique_violation(&err) {
        EngineError::Conflict(message.to_string())
    } else {
        EngineError::Database(err)
    }
}

/// Claims the write lock for the caller's transaction.
///
/// SQLite opens transactions as readers and refuses to upgrade one to a
/// writer while another connection is writing. The first write statement of
/// a transaction takes the lock (waiting on the busy timeout), even when it
/// matches no rows.
pub(crate) async fn reserve_writer<C>(db: &C) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    if db.get_database_backend() != DbBackend::Sqlite {
        return Ok(());
    }
    ledger::Entity::update_many()
        .col_expr(ledger::Column::Name, Expr::col(ledger::Column::Name).into())
        .filter(Expr::cust("1 = 0"))
        .exec(db)
        .await?;
    Ok(())
}
