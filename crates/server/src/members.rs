//! Membership management endpoints.

use api_types::membership::{MemberRoleUpdate, MemberView, OwnershipTransfer};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    LedgerContext, ServerError,
    convert::{member_view, role_from_wire},
    server::ServerState,
};

pub async fn list(
    ctx: LedgerContext,
    State(state): State<ServerState>,
) -> Result<Json<Vec<MemberView>>, ServerError> {
    let members = state
        .engine
        .list_members(ctx.user_id(), ctx.ledger_id)
        .await?
        .into_iter()
        .map(member_view)
        .collect();
    Ok(Json(members))
}

pub async fn change_role(
    ctx: LedgerContext,
    State(state): State<ServerState>,
    Path((_, user_id)): Path<(Uuid, String)>,
    Json(payload): Json<MemberRoleUpdate>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .change_member_role(
            ctx.user_id(),
            ctx.ledger_id,
            &user_id,
            role_from_wire(payload.role),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    ctx: LedgerContext,
    State(state): State<ServerState>,
    Path((_, user_id)): Path<(Uuid, String)>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .remove_member(ctx.user_id(), ctx.ledger_id, &user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller leaves the ledger.
pub async fn quit(
    ctx: LedgerContext,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .quit_ledger(ctx.user_id(), ctx.ledger_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transfer_ownership(
    ctx: LedgerContext,
    State(state): State<ServerState>,
    Json(payload): Json<OwnershipTransfer>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .transfer_ownership(ctx.user_id(), ctx.ledger_id, &payload.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
