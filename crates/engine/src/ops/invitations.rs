use chrono::{DateTime, Utc};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    Action, EngineError, Invitation, Membership, NewInvitation, RedemptionFailure, ResultEngine,
    Role,
    store::{InvitationStore, MembershipStore},
    token,
};

use super::{Engine, with_tx};

impl Engine {
    /// Issues a shareable invitation for `ledger_id`.
    ///
    /// `max_uses == 0` means unlimited. An expiry in the past is accepted and
    /// simply yields an invitation that is already expired.
    pub async fn create_invitation(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        default_role: Role,
        max_uses: u32,
        expires_at: Option<DateTime<Utc>>,
    ) -> ResultEngine<Invitation> {
        with_tx!(self, write |db_tx| {
            let actor = self
                .require_action(&db_tx, ledger_id, user_id, Action::InviteMembers)
                .await?;
            if default_role == Role::Owner {
                return Err(EngineError::Invariant(
                    "invitations cannot grant ownership".to_string(),
                ));
            }
            if !actor.role.can_assign(default_role) {
                return Err(EngineError::Forbidden(format!(
                    "{} may not invite as {}",
                    actor.role, default_role
                )));
            }

            let new = NewInvitation {
                ledger_id,
                default_role,
                max_uses,
                expires_at,
                created_by: user_id.to_string(),
            };
            let invitation = InvitationStore::create(&db_tx, self.tokens.as_ref(), &new).await?;
            tracing::info!(
                %ledger_id,
                user_id,
                role = %default_role,
                max_uses,
                "invitation created"
            );
            Ok(invitation)
        })
    }

    /// Invitations of a ledger, newest first (admin and above).
    pub async fn list_invitations(
        &self,
        user_id: &str,
        ledger_id: Uuid,
    ) -> ResultEngine<Vec<Invitation>> {
        with_tx!(self, |db_tx| {
            self.require_action(&db_tx, ledger_id, user_id, Action::InviteMembers)
                .await?;
            InvitationStore::list_by_ledger(&db_tx, ledger_id).await
        })
    }

    pub async fn revoke_invitation(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        token: &str,
    ) -> ResultEngine<Invitation> {
        with_tx!(self, write |db_tx| {
            self.require_action(&db_tx, ledger_id, user_id, Action::InviteMembers)
                .await?;
            let invitation = InvitationStore::revoke(&db_tx, ledger_id, token, Utc::now()).await?;
            tracing::info!(%ledger_id, user_id, "invitation revoked");
            Ok(invitation)
        })
    }

    /// Redeems an invitation token into a membership of its ledger.
    ///
    /// A caller who is already a member still consumes a use and gets their
    /// existing membership back unchanged.
    pub async fn join_by_invitation(
        &self,
        user_id: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Membership> {
        if !token::is_well_formed(token) {
            tracing::warn!(user_id, "rejected malformed invitation token");
            return Err(EngineError::Redemption(RedemptionFailure::NotFound));
        }

        with_tx!(self, write |db_tx| {
            let invitation = match InvitationStore::try_redeem(&db_tx, token, now).await {
                Ok(invitation) => invitation,
                Err(EngineError::Redemption(reason)) => {
                    tracing::warn!(user_id, %reason, "invitation redemption refused");
                    return Err(EngineError::Redemption(reason));
                }
                Err(err) => return Err(err),
            };

            let ledger_id = invitation.ledger_id;
            match MembershipStore::insert(
                &db_tx,
                ledger_id,
                user_id,
                invitation.default_role,
                Some(invitation.created_by.as_str()),
            )
            .await
            {
                Ok(membership) => {
                    tracing::info!(
                        %ledger_id,
                        user_id,
                        role = %membership.role,
                        "member joined by invitation"
                    );
                    Ok(membership)
                }
                Err(EngineError::Conflict(_)) => {
                    tracing::info!(%ledger_id, user_id, "invitation redeemed by existing member");
                    MembershipStore::get(&db_tx, ledger_id, user_id).await
                }
                Err(err) => Err(err),
            }
        })
    }
}
