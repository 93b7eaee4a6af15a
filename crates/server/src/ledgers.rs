//! Ledger endpoints.

use api_types::ledger::{LedgerCreated, LedgerList, LedgerNew, LedgerUpdate, LedgerView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::users;

use crate::{
    LedgerContext, ServerError,
    convert::{currency_from_wire, ledger_view},
    server::ServerState,
};

/// Every ledger the caller belongs to, plus the one to open by default.
pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<LedgerList>, ServerError> {
    let list = state.engine.list_ledgers(&user.id).await?;
    Ok(Json(LedgerList {
        ledgers: list.ledgers.into_iter().map(ledger_view).collect(),
        default_ledger_id: list.default_ledger_id,
    }))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<LedgerNew>,
) -> Result<(StatusCode, Json<LedgerCreated>), ServerError> {
    let ledger = state
        .engine
        .create_ledger(
            &user.id,
            &payload.name,
            payload.description.as_deref(),
            payload.currency.map(currency_from_wire),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LedgerCreated {
            ledger_id: ledger.id,
        }),
    ))
}

/// Detail of the ledger chosen by the path or the `X-Ledger-Id` header.
pub async fn get(
    ctx: LedgerContext,
    State(state): State<ServerState>,
) -> Result<Json<LedgerView>, ServerError> {
    let summary = state.engine.ledger(ctx.user_id(), ctx.ledger_id).await?;
    Ok(Json(ledger_view(summary)))
}

pub async fn update(
    ctx: LedgerContext,
    State(state): State<ServerState>,
    Json(payload): Json<LedgerUpdate>,
) -> Result<Json<LedgerView>, ServerError> {
    state
        .engine
        .update_ledger(
            ctx.user_id(),
            ctx.ledger_id,
            engine::LedgerUpdate {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;
    let summary = state.engine.ledger(ctx.user_id(), ctx.ledger_id).await?;
    Ok(Json(ledger_view(summary)))
}

pub async fn delete(
    ctx: LedgerContext,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_ledger(ctx.user_id(), ctx.ledger_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_default(
    ctx: LedgerContext,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .set_default_ledger(ctx.user_id(), ctx.ledger_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
