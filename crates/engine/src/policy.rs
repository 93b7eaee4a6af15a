//! Role policy for shared ledgers.
//!
//! Roles form a total order `owner > admin > editor > viewer`. Every action
//! has a minimum role; member-management actions additionally look at the
//! role of the member being changed. The owner slot never moves through
//! role changes, only through an ownership transfer.

use core::fmt;

use crate::EngineError;

/// Privilege level of a member inside one ledger.
///
/// Declaration order is privilege order, so `Ord` compares privilege.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Viewer,
    Editor,
    Admin,
    Owner,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Viewer, Role::Editor, Role::Admin, Role::Owner];

    /// Canonical role string stored in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Whether a member holding `self` may perform `action`.
    pub fn can(self, action: Action) -> bool {
        if self < action.minimum_role() {
            return false;
        }
        match action {
            // Nobody touches a member at or above their own level, except the
            // owner; and the owner slot itself is only reachable by transfer.
            Action::ChangeMemberRole { target } | Action::RemoveMember { target } => {
                target != Role::Owner && (self == Role::Owner || target < self)
            }
            _ => true,
        }
    }

    /// Whether a member holding `self` may hand out `role`, either by changing
    /// a member's role or through an invitation's default role.
    pub fn can_assign(self, role: Role) -> bool {
        self >= MANAGE_MEMBERS && role != Role::Owner && role <= self
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(EngineError::InvalidInput(format!(
                "invalid membership role: {other}"
            ))),
        }
    }
}

/// Lowest role allowed to manage other members.
const MANAGE_MEMBERS: Role = Role::Admin;

/// Something a member may try to do inside a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    View,
    EditTransactions,
    ManageBudgets,
    InviteMembers,
    UpdateLedger,
    /// Change the role of a member currently holding `target`.
    ChangeMemberRole { target: Role },
    /// Remove a member currently holding `target`.
    RemoveMember { target: Role },
    DeleteLedger,
    TransferOwnership,
}

impl Action {
    /// The permission table.
    const fn minimum_role(self) -> Role {
        match self {
            Action::View => Role::Viewer,
            Action::EditTransactions | Action::ManageBudgets => Role::Editor,
            Action::InviteMembers
            | Action::UpdateLedger
            | Action::ChangeMemberRole { .. }
            | Action::RemoveMember { .. } => MANAGE_MEMBERS,
            Action::DeleteLedger | Action::TransferOwnership => Role::Owner,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::EditTransactions => "edit transactions",
            Action::ManageBudgets => "manage budgets",
            Action::InviteMembers => "invite members",
            Action::UpdateLedger => "update ledger",
            Action::ChangeMemberRole { .. } => "change member role",
            Action::RemoveMember { .. } => "remove member",
            Action::DeleteLedger => "delete ledger",
            Action::TransferOwnership => "transfer ownership",
        }
    }
}
