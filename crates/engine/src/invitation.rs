//! Invitations: shareable tokens that turn into memberships when redeemed.
//!
//! Only `used_count` and `revoked` are persisted state. Exhaustion and
//! expiry are computed from the row and the current time.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Role, util::parse_uuid};

/// Lifecycle state of an invitation at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvitationStatus {
    Active,
    Exhausted,
    Expired,
    Revoked,
}

impl InvitationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Exhausted => "exhausted",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invitation {
    pub token: String,
    pub ledger_id: Uuid,
    /// Role granted to whoever redeems the invitation.
    pub default_role: Role,
    /// `0` means unlimited.
    pub max_uses: u32,
    pub used_count: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Status at `now`. Revocation wins over expiry, expiry over exhaustion.
    pub fn status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.revoked {
            InvitationStatus::Revoked
        } else if self.expires_at.is_some_and(|at| at <= now) {
            InvitationStatus::Expired
        } else if self.max_uses > 0 && self.used_count >= self.max_uses {
            InvitationStatus::Exhausted
        } else {
            InvitationStatus::Active
        }
    }

    /// Remaining redemptions, `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<u32> {
        (self.max_uses > 0).then(|| self.max_uses.saturating_sub(self.used_count))
    }
}

/// Parameters of a new invitation; the token is chosen by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewInvitation {
    pub ledger_id: Uuid,
    pub default_role: Role,
    pub max_uses: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: String,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invitations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    pub ledger_id: String,
    pub default_role: String,
    pub max_uses: i64,
    pub used_count: i64,
    pub expires_at: Option<DateTimeUtc>,
    pub revoked: bool,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ledger::Entity",
        from = "Column::LedgerId",
        to = "super::ledger::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Ledgers,
}

impl Related<super::ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn issued(token: String, new: &NewInvitation, created_at: DateTime<Utc>) -> Self {
        Self {
            token: ActiveValue::Set(token),
            ledger_id: ActiveValue::Set(new.ledger_id.to_string()),
            default_role: ActiveValue::Set(new.default_role.as_str().to_string()),
            max_uses: ActiveValue::Set(i64::from(new.max_uses)),
            used_count: ActiveValue::Set(0),
            expires_at: ActiveValue::Set(new.expires_at),
            revoked: ActiveValue::Set(false),
            created_by: ActiveValue::Set(new.created_by.clone()),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

fn stored_count(value: i64, label: &str) -> Result<u32, EngineError> {
    u32::try_from(value).map_err(|_| EngineError::Internal(format!("invalid stored {label}")))
}

impl TryFrom<Model> for Invitation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            ledger_id: parse_uuid(&model.ledger_id, "ledger")?,
            default_role: Role::try_from(model.default_role.as_str())?,
            max_uses: stored_count(model.max_uses, "max_uses")?,
            used_count: stored_count(model.used_count, "used_count")?,
            token: model.token,
            expires_at: model.expires_at,
            revoked: model.revoked,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
