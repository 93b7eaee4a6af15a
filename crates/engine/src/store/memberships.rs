use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, Membership, ResultEngine, Role, membership};

use super::conflict_on_unique;

/// Membership table operations.
///
/// Enforces one membership per (ledger, user) and exactly one owner per
/// ledger. The database backs both rules with the composite primary key and
/// a partial unique index on owner rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct MembershipStore;

impl MembershipStore {
    /// Inserts the founding owner of a freshly created ledger.
    pub async fn create_owner<C>(db: &C, ledger_id: Uuid, user_id: &str) -> ResultEngine<Membership>
    where
        C: ConnectionTrait,
    {
        if Self::find(db, ledger_id, user_id).await?.is_some() {
            return Err(EngineError::Conflict("membership already exists".to_string()));
        }
        if Self::owner(db, ledger_id).await?.is_some() {
            return Err(EngineError::Conflict("ledger already has an owner".to_string()));
        }

        let membership = Membership {
            ledger_id,
            user_id: user_id.to_string(),
            role: Role::Owner,
            joined_at: Utc::now(),
            invited_by: None,
            is_default: false,
        };
        membership::ActiveModel::from(&membership)
            .insert(db)
            .await
            .map_err(|err| conflict_on_unique(err, "ledger already has an owner"))?;
        Ok(membership)
    }

    pub async fn find<C>(db: &C, ledger_id: Uuid, user_id: &str) -> ResultEngine<Option<Membership>>
    where
        C: ConnectionTrait,
    {
        membership::Entity::find_by_id((ledger_id.to_string(), user_id.to_string()))
            .one(db)
            .await?
            .map(Membership::try_from)
            .transpose()
    }

    pub async fn get<C>(db: &C, ledger_id: Uuid, user_id: &str) -> ResultEngine<Membership>
    where
        C: ConnectionTrait,
    {
        Self::find(db, ledger_id, user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("membership".to_string()))
    }

    /// Members of a ledger, oldest first.
    pub async fn list<C>(db: &C, ledger_id: Uuid) -> ResultEngine<Vec<Membership>>
    where
        C: ConnectionTrait,
    {
        membership::Entity::find()
            .filter(membership::Column::LedgerId.eq(ledger_id.to_string()))
            .order_by_asc(membership::Column::JoinedAt)
            .order_by_asc(membership::Column::UserId)
            .all(db)
            .await?
            .into_iter()
            .map(Membership::try_from)
            .collect()
    }

    /// Every membership of a user, oldest first.
    pub async fn list_for_user<C>(db: &C, user_id: &str) -> ResultEngine<Vec<Membership>>
    where
        C: ConnectionTrait,
    {
        membership::Entity::find()
            .filter(membership::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(membership::Column::JoinedAt)
            .order_by_asc(membership::Column::LedgerId)
            .all(db)
            .await?
            .into_iter()
            .map(Membership::try_from)
            .collect()
    }

    pub async fn owner<C>(db: &C, ledger_id: Uuid) -> ResultEngine<Option<Membership>>
    where
        C: ConnectionTrait,
    {
        membership::Entity::find()
            .filter(membership::Column::LedgerId.eq(ledger_id.to_string()))
            .filter(membership::Column::Role.eq(Role::Owner.as_str()))
            .one(db)
            .await?
            .map(Membership::try_from)
            .transpose()
    }

    pub async fn count<C>(db: &C, ledger_id: Uuid) -> ResultEngine<u64>
    where
        C: ConnectionTrait,
    {
        membership::Entity::find()
            .filter(membership::Column::LedgerId.eq(ledger_id.to_string()))
            .count(db)
            .await
            .map_err(Into::into)
    }

    /// Adds a non-owner member. A second insert for the same user is a
    /// `Conflict`, which lets redemption retries detect existing members.
    pub async fn insert<C>(
        db: &C,
        ledger_id: Uuid,
        user_id: &str,
        role: Role,
        invited_by: Option<&str>,
    ) -> ResultEngine<Membership>
    where
        C: ConnectionTrait,
    {
        if role == Role::Owner {
            return Err(EngineError::Invariant(
                "owners are only created with their ledger".to_string(),
            ));
        }
        if Self::find(db, ledger_id, user_id).await?.is_some() {
            return Err(EngineError::Conflict("user is already a member".to_string()));
        }

        let membership = Membership {
            ledger_id,
            user_id: user_id.to_string(),
            role,
            joined_at: Utc::now(),
            invited_by: invited_by.map(ToString::to_string),
            is_default: false,
        };
        membership::ActiveModel::from(&membership)
            .insert(db)
            .await
            .map_err(|err| conflict_on_unique(err, "user is already a member"))?;
        Ok(membership)
    }

    pub async fn update_role<C>(
        db: &C,
        ledger_id: Uuid,
        user_id: &str,
        new_role: Role,
    ) -> ResultEngine<Membership>
    where
        C: ConnectionTrait,
    {
        let mut current = Self::get(db, ledger_id, user_id).await?;
        if current.role == new_role {
            return Ok(current);
        }
        if current.role == Role::Owner {
            return Err(EngineError::Invariant(
                "the owner role only moves through a transfer".to_string(),
            ));
        }
        if new_role == Role::Owner {
            return Err(EngineError::Invariant("ledger already has an owner".to_string()));
        }

        membership::ActiveModel {
            ledger_id: ActiveValue::Set(ledger_id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            role: ActiveValue::Set(new_role.as_str().to_string()),
            ..Default::default()
        }
        .update(db)
        .await?;

        current.role = new_role;
        Ok(current)
    }

    pub async fn remove<C>(db: &C, ledger_id: Uuid, user_id: &str) -> ResultEngine<()>
    where
        C: ConnectionTrait,
    {
        let current = Self::get(db, ledger_id, user_id).await?;
        if current.role == Role::Owner {
            return Err(EngineError::Invariant(
                "cannot remove the ledger owner".to_string(),
            ));
        }
        membership::Entity::delete_by_id((ledger_id.to_string(), user_id.to_string()))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Demotes `from_user_id` to admin and promotes `to_user_id` to owner.
    ///
    /// Callers run this inside one transaction; the demotion goes first so
    /// the owner index never sees two owners.
    pub async fn transfer_ownership<C>(
        db: &C,
        ledger_id: Uuid,
        from_user_id: &str,
        to_user_id: &str,
    ) -> ResultEngine<(Membership, Membership)>
    where
        C: ConnectionTrait,
    {
        if from_user_id == to_user_id {
            return Err(EngineError::Invariant(
                "ownership must move to another member".to_string(),
            ));
        }
        let mut from = Self::get(db, ledger_id, from_user_id).await?;
        let mut to = Self::get(db, ledger_id, to_user_id).await?;
        if from.role != Role::Owner {
            return Err(EngineError::Invariant(format!(
                "{from_user_id} is not the ledger owner"
            )));
        }

        let demoted = Self::set_role_where(db, ledger_id, from_user_id, Role::Owner, Role::Admin)
            .await?;
        if demoted != 1 {
            return Err(EngineError::Invariant(format!(
                "{from_user_id} is not the ledger owner"
            )));
        }
        let promoted = Self::set_role_where(db, ledger_id, to_user_id, to.role, Role::Owner).await?;
        if promoted != 1 {
            return Err(EngineError::Invariant(format!(
                "{to_user_id} changed role during the transfer"
            )));
        }

        from.role = Role::Admin;
        to.role = Role::Owner;
        Ok((from, to))
    }

    /// Conditional role update; returns the number of rows changed.
    async fn set_role_where<C>(
        db: &C,
        ledger_id: Uuid,
        user_id: &str,
        expected: Role,
        new_role: Role,
    ) -> ResultEngine<u64>
    where
        C: ConnectionTrait,
    {
        let result = membership::Entity::update_many()
            .col_expr(membership::Column::Role, Expr::value(new_role.as_str()))
            .filter(membership::Column::LedgerId.eq(ledger_id.to_string()))
            .filter(membership::Column::UserId.eq(user_id.to_string()))
            .filter(membership::Column::Role.eq(expected.as_str()))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Flags `ledger_id` as the user's default ledger and clears the flag on
    /// every other membership of that user.
    pub async fn set_default<C>(db: &C, user_id: &str, ledger_id: Uuid) -> ResultEngine<()>
    where
        C: ConnectionTrait,
    {
        membership::Entity::update_many()
            .col_expr(membership::Column::IsDefault, Expr::value(false))
            .filter(membership::Column::UserId.eq(user_id.to_string()))
            .exec(db)
            .await?;
        let result = membership::Entity::update_many()
            .col_expr(membership::Column::IsDefault, Expr::value(true))
            .filter(membership::Column::UserId.eq(user_id.to_string()))
            .filter(membership::Column::LedgerId.eq(ledger_id.to_string()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound("membership".to_string()));
        }
        Ok(())
    }

    /// Drops every membership of a ledger, owner included. Only ledger
    /// deletion may call this.
    pub async fn remove_all<C>(db: &C, ledger_id: Uuid) -> ResultEngine<u64>
    where
        C: ConnectionTrait,
    {
        let result = membership::Entity::delete_many()
            .filter(membership::Column::LedgerId.eq(ledger_id.to_string()))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
