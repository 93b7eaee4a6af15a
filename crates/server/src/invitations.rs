//! Invitation endpoints.

use api_types::{
    invitation::{InvitationNew, InvitationView, JoinLedgerResponse},
    membership::LedgerRole,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::users;
use uuid::Uuid;

use crate::{
    LedgerContext, ServerError,
    convert::{invitation_view, role_from_wire, role_to_wire},
    server::ServerState,
};

pub async fn create(
    ctx: LedgerContext,
    State(state): State<ServerState>,
    Json(payload): Json<InvitationNew>,
) -> Result<(StatusCode, Json<InvitationView>), ServerError> {
    let role = role_from_wire(payload.default_role.unwrap_or(LedgerRole::Editor));
    let invitation = state
        .engine
        .create_invitation(
            ctx.user_id(),
            ctx.ledger_id,
            role,
            payload.max_uses,
            payload.expires_at,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(invitation_view(invitation, &state.public_url, Utc::now())),
    ))
}

pub async fn list(
    ctx: LedgerContext,
    State(state): State<ServerState>,
) -> Result<Json<Vec<InvitationView>>, ServerError> {
    let now = Utc::now();
    let invitations = state
        .engine
        .list_invitations(ctx.user_id(), ctx.ledger_id)
        .await?
        .into_iter()
        .map(|invitation| invitation_view(invitation, &state.public_url, now))
        .collect();
    Ok(Json(invitations))
}

pub async fn revoke(
    ctx: LedgerContext,
    State(state): State<ServerState>,
    Path((_, token)): Path<(Uuid, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .revoke_invitation(ctx.user_id(), ctx.ledger_id, &token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Redeems an invitation for the caller. Not ledger-scoped: the ledger comes
/// from the invitation itself.
pub async fn join(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<JoinLedgerResponse>, ServerError> {
    let membership = state
        .engine
        .join_by_invitation(&user.id, &token, Utc::now())
        .await?;

    Ok(Json(JoinLedgerResponse {
        ledger_id: membership.ledger_id,
        role: role_to_wire(membership.role),
    }))
}
