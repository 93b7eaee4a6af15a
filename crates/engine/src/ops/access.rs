use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Action, EngineError, Membership, ResultEngine, Role, ledger, store::MembershipStore};

use super::{Engine, with_tx};

/// An authorized (user, ledger) pair together with the user's role there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessContext {
    pub user_id: String,
    pub ledger_id: Uuid,
    pub role: Role,
}

impl AccessContext {
    pub fn can(&self, action: Action) -> bool {
        self.role.can(action)
    }
}

fn no_access() -> EngineError {
    EngineError::Forbidden("no access to this ledger".to_string())
}

impl Engine {
    /// Checks that `user_id` may perform `action` on `ledger_id`.
    ///
    /// Missing ledgers and ledgers the user does not belong to look the same
    /// to the caller: both are `Forbidden`.
    pub async fn authorize(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        action: Action,
    ) -> ResultEngine<AccessContext> {
        with_tx!(self, |db_tx| {
            let membership = self
                .require_action(&db_tx, ledger_id, user_id, action)
                .await?;
            Ok(AccessContext {
                user_id: membership.user_id,
                ledger_id,
                role: membership.role,
            })
        })
    }

    pub(super) async fn find_live_ledger(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
    ) -> ResultEngine<Option<ledger::Model>> {
        ledger::Entity::find_by_id(ledger_id.to_string())
            .filter(ledger::Column::DeletedAt.is_null())
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// The caller's membership in a live ledger, or `Forbidden`.
    pub(super) async fn require_member(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Membership> {
        if self.find_live_ledger(db, ledger_id).await?.is_none() {
            return Err(no_access());
        }
        MembershipStore::find(db, ledger_id, user_id)
            .await?
            .ok_or_else(no_access)
    }

    pub(super) async fn require_action(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
        user_id: &str,
        action: Action,
    ) -> ResultEngine<Membership> {
        let membership = self.require_member(db, ledger_id, user_id).await?;
        if !membership.role.can(action) {
            return Err(EngineError::Forbidden(format!(
                "{} may not {}",
                membership.role,
                action.name()
            )));
        }
        Ok(membership)
    }
}
