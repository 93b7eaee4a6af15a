use std::collections::HashMap;

use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Action, EngineError, Member, Membership, ResultEngine, Role, store::MembershipStore, users,
};

use super::{Engine, with_tx};

impl Engine {
    /// Members of a ledger with their usernames, oldest first.
    pub async fn list_members(&self, user_id: &str, ledger_id: Uuid) -> ResultEngine<Vec<Member>> {
        with_tx!(self, |db_tx| {
            self.require_action(&db_tx, ledger_id, user_id, Action::View)
                .await?;
            let memberships = MembershipStore::list(&db_tx, ledger_id).await?;
            let ids: Vec<String> = memberships.iter().map(|m| m.user_id.clone()).collect();
            let usernames: HashMap<String, String> = users::Entity::find()
                .filter(users::Column::Id.is_in(ids))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|user| (user.id, user.username))
                .collect();

            Ok(memberships
                .into_iter()
                .map(|m| Member {
                    username: usernames
                        .get(&m.user_id)
                        .cloned()
                        .unwrap_or_else(|| m.user_id.clone()),
                    user_id: m.user_id,
                    role: m.role,
                    joined_at: m.joined_at,
                    invited_by: m.invited_by,
                })
                .collect())
        })
    }

    /// Changes another member's role.
    ///
    /// The actor must outrank the target (owners excepted) and may not hand
    /// out a role above their own or the owner role.
    pub async fn change_member_role(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        target_user_id: &str,
        new_role: Role,
    ) -> ResultEngine<Membership> {
        with_tx!(self, write |db_tx| {
            let actor = self.require_member(&db_tx, ledger_id, user_id).await?;
            let target = MembershipStore::get(&db_tx, ledger_id, target_user_id).await?;
            let forbidden = || {
                EngineError::Forbidden(format!(
                    "{} may not make a {} into {}",
                    actor.role, target.role, new_role
                ))
            };
            if !actor.role.can(Action::ChangeMemberRole {
                target: target.role,
            }) {
                return Err(forbidden());
            }
            if new_role == Role::Owner {
                return Err(EngineError::Invariant(
                    "ownership moves only through a transfer".to_string(),
                ));
            }
            if !actor.role.can_assign(new_role) {
                return Err(forbidden());
            }
            let updated =
                MembershipStore::update_role(&db_tx, ledger_id, target_user_id, new_role).await?;
            tracing::info!(
                %ledger_id,
                actor = user_id,
                target = target_user_id,
                from = %target.role,
                to = %new_role,
                "member role changed"
            );
            Ok(updated)
        })
    }

    /// Removes another member. Owners cannot be removed at all.
    pub async fn remove_member(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        target_user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, write |db_tx| {
            let actor = self.require_member(&db_tx, ledger_id, user_id).await?;
            let target = MembershipStore::get(&db_tx, ledger_id, target_user_id).await?;
            if target.role == Role::Owner {
                return Err(EngineError::OwnerMustTransfer);
            }
            if !actor.role.can(Action::RemoveMember {
                target: target.role,
            }) {
                return Err(EngineError::Forbidden(format!(
                    "{} may not remove a {}",
                    actor.role, target.role
                )));
            }
            MembershipStore::remove(&db_tx, ledger_id, target_user_id).await?;
            tracing::info!(
                %ledger_id,
                actor = user_id,
                target = target_user_id,
                "member removed"
            );
            Ok(())
        })
    }

    /// Leaves a ledger. The owner has to hand the ledger over first.
    pub async fn quit_ledger(&self, user_id: &str, ledger_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, write |db_tx| {
            let membership = self.require_member(&db_tx, ledger_id, user_id).await?;
            if membership.role == Role::Owner {
                return Err(EngineError::OwnerMustTransfer);
            }
            MembershipStore::remove(&db_tx, ledger_id, user_id).await?;
            tracing::info!(%ledger_id, user_id, "member left ledger");
            Ok(())
        })
    }

    /// Hands the ledger to another member; the previous owner becomes admin.
    pub async fn transfer_ownership(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        target_user_id: &str,
    ) -> ResultEngine<Membership> {
        with_tx!(self, write |db_tx| {
            self.require_action(&db_tx, ledger_id, user_id, Action::TransferOwnership)
                .await?;
            let (_, new_owner) =
                MembershipStore::transfer_ownership(&db_tx, ledger_id, user_id, target_user_id)
                    .await?;
            tracing::info!(
                %ledger_id,
                from = user_id,
                to = target_user_id,
                "ownership transferred"
            );
            Ok(new_owner)
        })
    }
}
