//! The `Ledger` is a shared bookkeeping workspace. Its owner is not stored on
//! the row: it is whichever membership currently holds the `owner` role.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{Currency, EngineError, Role, util::parse_uuid};

/// Ledger metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl Ledger {
    pub(crate) fn new(name: String, description: Option<String>, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            currency,
            created_at: Utc::now(),
        }
    }
}

/// A ledger as seen by one of its members.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSummary {
    pub ledger: Ledger,
    pub owner_id: String,
    /// Role of the member who asked.
    pub role: Role,
    pub member_count: u64,
    pub is_default: bool,
}

/// Every ledger a user belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerList {
    pub ledgers: Vec<LedgerSummary>,
    /// The ledger flagged as default, or the earliest joined one.
    pub default_ledger_id: Option<Uuid>,
}

/// Partial update of a ledger's metadata.
///
/// `None` keeps the field; an empty description clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ledgers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub currency: String,
    pub created_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::membership::Entity")]
    Memberships,
    #[sea_orm(has_many = "super::invitation::Entity")]
    Invitations,
}

impl Related<super::membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::invitation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invitations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Ledger> for ActiveModel {
    fn from(value: &Ledger) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            created_at: ActiveValue::Set(value.created_at),
            deleted_at: ActiveValue::Set(None),
        }
    }
}

impl TryFrom<Model> for Ledger {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "ledger")?,
            name: model.name,
            description: model.description,
            currency: Currency::try_from(model.currency.as_str())?,
            created_at: model.created_at,
        })
    }
}
