use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Action, Currency, EngineError, Ledger, LedgerList, LedgerSummary, LedgerUpdate, Membership,
    ResultEngine, ledger,
    store::{InvitationStore, MembershipStore},
    util::{normalize_optional_text, normalize_required_name},
};

use super::{DeletionMode, Engine, with_tx};

impl Engine {
    /// Creates a ledger owned by `owner_id`.
    ///
    /// The ledger row and the owner membership are written in one
    /// transaction.
    pub async fn create_ledger(
        &self,
        owner_id: &str,
        name: &str,
        description: Option<&str>,
        currency: Option<Currency>,
    ) -> ResultEngine<Ledger> {
        let name = normalize_required_name(name, "ledger")?;
        let ledger = Ledger::new(
            name,
            normalize_optional_text(description),
            currency.unwrap_or(self.default_currency),
        );

        with_tx!(self, write |db_tx| {
            ledger::ActiveModel::from(&ledger).insert(&db_tx).await?;
            MembershipStore::create_owner(&db_tx, ledger.id, owner_id).await?;
            tracing::info!(ledger_id = %ledger.id, owner_id, "ledger created");
            Ok(ledger)
        })
    }

    /// Every live ledger `user_id` belongs to.
    pub async fn list_ledgers(&self, user_id: &str) -> ResultEngine<LedgerList> {
        with_tx!(self, |db_tx| {
            let memberships = MembershipStore::list_for_user(&db_tx, user_id).await?;
            let mut ledgers = Vec::with_capacity(memberships.len());
            for membership in memberships {
                if let Some(summary) = self.summarize(&db_tx, membership).await? {
                    ledgers.push(summary);
                }
            }
            let default_ledger_id = ledgers
                .iter()
                .find(|summary| summary.is_default)
                .or_else(|| ledgers.first())
                .map(|summary| summary.ledger.id);
            Ok(LedgerList {
                ledgers,
                default_ledger_id,
            })
        })
    }

    /// Detail of one ledger as seen by a member.
    pub async fn ledger(&self, user_id: &str, ledger_id: Uuid) -> ResultEngine<LedgerSummary> {
        with_tx!(self, |db_tx| {
            let membership = self.require_member(&db_tx, ledger_id, user_id).await?;
            self.summarize(&db_tx, membership)
                .await?
                .ok_or_else(|| EngineError::Forbidden("no access to this ledger".to_string()))
        })
    }

    /// Renames or re-describes a ledger (admin and above).
    pub async fn update_ledger(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        update: LedgerUpdate,
    ) -> ResultEngine<Ledger> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "ledger"))
            .transpose()?;

        with_tx!(self, write |db_tx| {
            self.require_action(&db_tx, ledger_id, user_id, Action::UpdateLedger)
                .await?;
            let model = self
                .find_live_ledger(&db_tx, ledger_id)
                .await?
                .ok_or_else(|| EngineError::NotFound("ledger".to_string()))?;

            let mut active: ledger::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(description) = update.description.as_deref() {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            let updated = active.update(&db_tx).await?;
            tracing::info!(%ledger_id, user_id, "ledger updated");
            Ledger::try_from(updated)
        })
    }

    /// Deletes a ledger (owner only), cascading to memberships and
    /// invitations according to the configured [`DeletionMode`].
    pub async fn delete_ledger(&self, user_id: &str, ledger_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, write |db_tx| {
            self.require_action(&db_tx, ledger_id, user_id, Action::DeleteLedger)
                .await?;
            match self.deletion {
                DeletionMode::Soft => {
                    let revoked = InvitationStore::revoke_all(&db_tx, ledger_id).await?;
                    let removed = MembershipStore::remove_all(&db_tx, ledger_id).await?;
                    ledger::ActiveModel {
                        id: ActiveValue::Set(ledger_id.to_string()),
                        deleted_at: ActiveValue::Set(Some(Utc::now())),
                        ..Default::default()
                    }
                    .update(&db_tx)
                    .await?;
                    tracing::info!(%ledger_id, user_id, revoked, removed, "ledger soft-deleted");
                }
                DeletionMode::Hard => {
                    let deleted = InvitationStore::delete_all(&db_tx, ledger_id).await?;
                    let removed = MembershipStore::remove_all(&db_tx, ledger_id).await?;
                    ledger::Entity::delete_by_id(ledger_id.to_string())
                        .exec(&db_tx)
                        .await?;
                    tracing::info!(%ledger_id, user_id, deleted, removed, "ledger deleted");
                }
            }
            Ok(())
        })
    }

    /// Marks `ledger_id` as the caller's default ledger.
    pub async fn set_default_ledger(&self, user_id: &str, ledger_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, write |db_tx| {
            self.require_member(&db_tx, ledger_id, user_id).await?;
            MembershipStore::set_default(&db_tx, user_id, ledger_id).await?;
            tracing::debug!(%ledger_id, user_id, "default ledger changed");
            Ok(())
        })
    }

    /// Builds the caller's view of a ledger; `None` if the ledger is gone.
    async fn summarize(
        &self,
        db: &DatabaseTransaction,
        membership: Membership,
    ) -> ResultEngine<Option<LedgerSummary>> {
        let Some(model) = self.find_live_ledger(db, membership.ledger_id).await? else {
            return Ok(None);
        };
        let owner = MembershipStore::owner(db, membership.ledger_id)
            .await?
            .ok_or_else(|| EngineError::Internal("ledger without owner".to_string()))?;
        let member_count = MembershipStore::count(db, membership.ledger_id).await?;
        Ok(Some(LedgerSummary {
            ledger: Ledger::try_from(model)?,
            owner_id: owner.user_id,
            role: membership.role,
            member_count,
            is_default: membership.is_default,
        }))
    }
}
