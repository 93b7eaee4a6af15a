use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request header carrying the ledger a request applies to.
pub const LEDGER_HEADER: &str = "x-ledger-id";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cny,
    Eur,
    Gbp,
    Jpy,
    Usd,
}

pub mod membership {
    use super::*;

    /// Role of a user in a shared ledger.
    ///
    /// Roles are totally ordered: `owner` > `admin` > `editor` > `viewer`.
    /// - `owner`: everything, including deleting and handing over the ledger.
    /// - `admin`: manages members below admin and issues invitations.
    /// - `editor`: records transactions and budgets.
    /// - `viewer`: read-only.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LedgerRole {
        Owner,
        Admin,
        Editor,
        Viewer,
    }

    impl LedgerRole {
        /// Returns the canonical role string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Owner => "owner",
                Self::Admin => "admin",
                Self::Editor => "editor",
                Self::Viewer => "viewer",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MemberView {
        pub user_id: String,
        pub username: String,
        pub role: LedgerRole,
        pub joined_at: DateTime<Utc>,
        pub invited_by: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MemberRoleUpdate {
        pub role: LedgerRole,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OwnershipTransfer {
        /// Member who becomes the new owner.
        pub user_id: String,
    }
}

pub mod ledger {
    use super::{membership::LedgerRole, *};

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerNew {
        pub name: String,
        #[serde(default)]
        pub description: Option<String>,
        #[serde(default)]
        pub currency: Option<Currency>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerCreated {
        pub ledger_id: Uuid,
    }

    /// Fields left out are kept; an empty description clears it.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerUpdate {
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default)]
        pub description: Option<String>,
    }

    /// A ledger as seen by the requesting member.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub currency: Currency,
        pub created_at: DateTime<Utc>,
        pub owner_id: String,
        pub role: LedgerRole,
        pub member_count: u64,
        pub is_default: bool,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerList {
        pub ledgers: Vec<LedgerView>,
        pub default_ledger_id: Option<Uuid>,
    }
}

pub mod invitation {
    use super::{membership::LedgerRole, *};

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InvitationNew {
        /// Defaults to `editor`.
        #[serde(default)]
        pub default_role: Option<LedgerRole>,
        /// `0` (the default) means unlimited.
        #[serde(default)]
        pub max_uses: u32,
        #[serde(default)]
        pub expires_at: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum InvitationStatus {
        Active,
        Exhausted,
        Expired,
        Revoked,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InvitationView {
        pub token: String,
        pub ledger_id: Uuid,
        pub default_role: LedgerRole,
        pub max_uses: u32,
        pub used_count: u32,
        /// `None` when the invitation has no use limit.
        pub remaining_uses: Option<u32>,
        pub expires_at: Option<DateTime<Utc>>,
        pub status: InvitationStatus,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        /// Shareable link, `{public_url}/join/{token}`.
        pub invite_url: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct JoinLedgerResponse {
        pub ledger_id: Uuid,
        pub role: LedgerRole,
    }
}

/// Error body returned by every failing endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
