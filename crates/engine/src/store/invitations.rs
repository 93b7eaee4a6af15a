use chrono::{DateTime, Utc};
use sea_orm::{Condition, ConnectionTrait, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Invitation, InvitationStatus, NewInvitation, RedemptionFailure, ResultEngine,
    TokenSource, invitation,
};

use super::is_unique_violation;

/// How many fresh tokens to try before giving up on a collision streak.
pub const MAX_TOKEN_ATTEMPTS: usize = 5;

/// Invitation table operations.
#[derive(Clone, Copy, Debug, Default)]
pub struct InvitationStore;

impl InvitationStore {
    /// Persists a new invitation under a freshly generated token.
    ///
    /// A token collision is retried with a new token; after
    /// [`MAX_TOKEN_ATTEMPTS`] collisions in a row the call fails with
    /// `Internal`.
    pub async fn create<C>(
        db: &C,
        tokens: &dyn TokenSource,
        new: &NewInvitation,
    ) -> ResultEngine<Invitation>
    where
        C: ConnectionTrait,
    {
        let created_at = Utc::now();
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = tokens.new_token();
            match invitation::ActiveModel::issued(token, new, created_at)
                .insert(db)
                .await
            {
                Ok(model) => return Invitation::try_from(model),
                Err(err) if is_unique_violation(&err) => {
                    tracing::debug!(attempt, "invitation token collision");
                }
                Err(err) => return Err(err.into()),
            }
        }
        tracing::error!(
            attempts = MAX_TOKEN_ATTEMPTS,
            "could not allocate a unique invitation token"
        );
        Err(EngineError::Internal(
            "could not allocate a unique invitation token".to_string(),
        ))
    }

    pub async fn find_by_token<C>(db: &C, token: &str) -> ResultEngine<Option<Invitation>>
    where
        C: ConnectionTrait,
    {
        invitation::Entity::find_by_id(token.to_string())
            .one(db)
            .await?
            .map(Invitation::try_from)
            .transpose()
    }

    pub async fn get_by_token<C>(db: &C, token: &str) -> ResultEngine<Invitation>
    where
        C: ConnectionTrait,
    {
        Self::find_by_token(db, token)
            .await?
            .ok_or_else(|| EngineError::NotFound("invitation".to_string()))
    }

    /// Invitations of a ledger, newest first.
    pub async fn list_by_ledger<C>(db: &C, ledger_id: Uuid) -> ResultEngine<Vec<Invitation>>
    where
        C: ConnectionTrait,
    {
        invitation::Entity::find()
            .filter(invitation::Column::LedgerId.eq(ledger_id.to_string()))
            .order_by_desc(invitation::Column::CreatedAt)
            .order_by_asc(invitation::Column::Token)
            .all(db)
            .await?
            .into_iter()
            .map(Invitation::try_from)
            .collect()
    }

    /// Revokes an active invitation of `ledger_id`.
    ///
    /// An invitation that is already revoked, expired or exhausted yields
    /// `AlreadyTerminal`; tokens of other ledgers are reported as missing.
    pub async fn revoke<C>(
        db: &C,
        ledger_id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Invitation>
    where
        C: ConnectionTrait,
    {
        let mut current = Self::get_by_token(db, token).await?;
        if current.ledger_id != ledger_id {
            return Err(EngineError::NotFound("invitation".to_string()));
        }
        let status = current.status(now);
        if status != InvitationStatus::Active {
            return Err(EngineError::AlreadyTerminal(status.as_str().to_string()));
        }

        let result = invitation::Entity::update_many()
            .col_expr(invitation::Column::Revoked, Expr::value(true))
            .filter(invitation::Column::Token.eq(token))
            .filter(invitation::Column::Revoked.eq(false))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::AlreadyTerminal(
                InvitationStatus::Revoked.as_str().to_string(),
            ));
        }

        current.revoked = true;
        Ok(current)
    }

    /// Atomically consumes one use of an active invitation.
    ///
    /// The validity checks and the increment are one conditional `UPDATE`,
    /// so concurrent redemptions can never push `used_count` past
    /// `max_uses`. On success the invitation is returned as it was before
    /// this redemption. On failure the row is read back only to report why.
    pub async fn try_redeem<C>(
        db: &C,
        token: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Invitation>
    where
        C: ConnectionTrait,
    {
        let result = invitation::Entity::update_many()
            .col_expr(
                invitation::Column::UsedCount,
                Expr::col(invitation::Column::UsedCount).add(1),
            )
            .filter(invitation::Column::Token.eq(token))
            .filter(invitation::Column::Revoked.eq(false))
            .filter(
                Condition::any()
                    .add(invitation::Column::ExpiresAt.is_null())
                    .add(invitation::Column::ExpiresAt.gt(now)),
            )
            .filter(
                Condition::any()
                    .add(invitation::Column::MaxUses.eq(0))
                    .add(
                        Expr::col(invitation::Column::UsedCount)
                            .lt(Expr::col(invitation::Column::MaxUses)),
                    ),
            )
            .exec(db)
            .await?;

        let current = Self::find_by_token(db, token).await?;
        if result.rows_affected == 1 {
            let mut redeemed = current.ok_or_else(|| {
                EngineError::Internal("redeemed invitation disappeared".to_string())
            })?;
            redeemed.used_count = redeemed.used_count.saturating_sub(1);
            return Ok(redeemed);
        }

        let Some(current) = current else {
            return Err(EngineError::Redemption(RedemptionFailure::NotFound));
        };
        let failure = match current.status(now) {
            InvitationStatus::Revoked => RedemptionFailure::Revoked,
            InvitationStatus::Expired => RedemptionFailure::Expired,
            InvitationStatus::Exhausted => RedemptionFailure::Exhausted,
            InvitationStatus::Active => {
                return Err(EngineError::Internal(
                    "active invitation refused redemption".to_string(),
                ));
            }
        };
        Err(EngineError::Redemption(failure))
    }

    /// Revokes every invitation of a ledger. Used by soft deletion.
    pub async fn revoke_all<C>(db: &C, ledger_id: Uuid) -> ResultEngine<u64>
    where
        C: ConnectionTrait,
    {
        let result = invitation::Entity::update_many()
            .col_expr(invitation::Column::Revoked, Expr::value(true))
            .filter(invitation::Column::LedgerId.eq(ledger_id.to_string()))
            .filter(invitation::Column::Revoked.eq(false))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Deletes every invitation of a ledger. Used by hard deletion.
    pub async fn delete_all<C>(db: &C, ledger_id: Uuid) -> ResultEngine<u64>
    where
        C: ConnectionTrait,
    {
        let result = invitation::Entity::delete_many()
            .filter(invitation::Column::LedgerId.eq(ledger_id.to_string()))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
