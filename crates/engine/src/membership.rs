//! Ledger memberships: one row per (ledger, user) with the user's role.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Role, util::parse_uuid};

/// The binding of one user to one ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Membership {
    pub ledger_id: Uuid,
    pub user_id: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    /// Creator of the invitation the member joined through.
    pub invited_by: Option<String>,
    /// Whether this is the member's default ledger.
    pub is_default: bool,
}

/// A membership joined with the member's username, for listings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub invited_by: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub ledger_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub role: String,
    pub joined_at: DateTimeUtc,
    pub invited_by: Option<String>,
    pub is_default: bool,
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

impl From<&Membership> for ActiveModel {
    fn from(value: &Membership) -> Self {
        Self {
            ledger_id: ActiveValue::Set(value.ledger_id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            role: ActiveValue::Set(value.role.as_str().to_string()),
            joined_at: ActiveValue::Set(value.joined_at),
            invited_by: ActiveValue::Set(value.invited_by.clone()),
            is_default: ActiveValue::Set(value.is_default),
        }
    }
}

impl TryFrom<Model> for Membership {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            ledger_id: parse_uuid(&model.ledger_id, "ledger")?,
            role: Role::try_from(model.role.as_str())?,
            user_id: model.user_id,
            joined_at: model.joined_at,
            invited_by: model.invited_by,
            is_default: model.is_default,
        })
    }
}
