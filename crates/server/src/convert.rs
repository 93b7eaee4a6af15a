//! Mapping between engine values and wire types.

use api_types::{
    Currency,
    invitation::{InvitationStatus, InvitationView},
    ledger::LedgerView,
    membership::{LedgerRole, MemberView},
};
use chrono::{DateTime, Utc};
use engine::{Invitation, LedgerSummary, Member, Role};

pub(crate) fn role_to_wire(role: Role) -> LedgerRole {
    match role {
        Role::Owner => LedgerRole::Owner,
        Role::Admin => LedgerRole::Admin,
        Role::Editor => LedgerRole::Editor,
        Role::Viewer => LedgerRole::Viewer,
    }
}

pub(crate) fn role_from_wire(role: LedgerRole) -> Role {
    match role {
        LedgerRole::Owner => Role::Owner,
        LedgerRole::Admin => Role::Admin,
        LedgerRole::Editor => Role::Editor,
        LedgerRole::Viewer => Role::Viewer,
    }
}

pub(crate) fn currency_to_wire(currency: engine::Currency) -> Currency {
    match currency {
        engine::Currency::Cny => Currency::Cny,
        engine::Currency::Eur => Currency::Eur,
        engine::Currency::Gbp => Currency::Gbp,
        engine::Currency::Jpy => Currency::Jpy,
        engine::Currency::Usd => Currency::Usd,
    }
}

pub(crate) fn currency_from_wire(currency: Currency) -> engine::Currency {
    match currency {
        Currency::Cny => engine::Currency::Cny,
        Currency::Eur => engine::Currency::Eur,
        Currency::Gbp => engine::Currency::Gbp,
        Currency::Jpy => engine::Currency::Jpy,
        Currency::Usd => engine::Currency::Usd,
    }
}

pub(crate) fn ledger_view(summary: LedgerSummary) -> LedgerView {
    LedgerView {
        id: summary.ledger.id,
        name: summary.ledger.name,
        description: summary.ledger.description,
        currency: currency_to_wire(summary.ledger.currency),
        created_at: summary.ledger.created_at,
        owner_id: summary.owner_id,
        role: role_to_wire(summary.role),
        member_count: summary.member_count,
        is_default: summary.is_default,
    }
}

pub(crate) fn member_view(member: Member) -> MemberView {
    MemberView {
        user_id: member.user_id,
        username: member.username,
        role: role_to_wire(member.role),
        joined_at: member.joined_at,
        invited_by: member.invited_by,
    }
}

pub(crate) fn invitation_view(
    invitation: Invitation,
    public_url: &str,
    now: DateTime<Utc>,
) -> InvitationView {
    let status = match invitation.status(now) {
        engine::InvitationStatus::Active => InvitationStatus::Active,
        engine::InvitationStatus::Exhausted => InvitationStatus::Exhausted,
        engine::InvitationStatus::Expired => InvitationStatus::Expired,
        engine::InvitationStatus::Revoked => InvitationStatus::Revoked,
    };
    InvitationView {
        invite_url: invite_url(public_url, &invitation.token),
        remaining_uses: invitation.remaining_uses(),
        ledger_id: invitation.ledger_id,
        default_role: role_to_wire(invitation.default_role),
        max_uses: invitation.max_uses,
        used_count: invitation.used_count,
        expires_at: invitation.expires_at,
        status,
        created_by: invitation.created_by,
        created_at: invitation.created_at,
        token: invitation.token,
    }
}

pub(crate) fn invite_url(public_url: &str, token: &str) -> String {
    format!("{}/join/{token}", public_url.trim_end_matches('/'))
}
