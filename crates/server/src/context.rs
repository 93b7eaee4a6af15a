//! Resolution of the ledger a request acts on.
//!
//! Ledger-scoped routes carry the ledger either in the `{ledger_id}` path
//! segment or, for routes without one, in the `X-Ledger-Id` header. The
//! caller's membership is checked before the handler runs.

use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Path},
    http::{HeaderName, HeaderValue, request::Parts},
};
use axum_extra::headers::{Error as AxumError, Header, HeaderMapExt};
use engine::{Action, Role, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

static LEDGER_HEADER: HeaderName = HeaderName::from_static(api_types::LEDGER_HEADER);

/// `TypedHeader` for the ledger selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerHeader(pub Uuid);

impl Header for LedgerHeader {
    fn name() -> &'static HeaderName {
        &LEDGER_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = Uuid::parse_str(value.trim()) else {
            return Err(AxumError::invalid());
        };

        Ok(LedgerHeader(value))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        match HeaderValue::from_str(&self.0.to_string()) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-ledger-id header"),
        }
    }
}

/// The authenticated caller, the ledger the request targets and the
/// caller's role there.
#[derive(Clone, Debug)]
pub struct LedgerContext {
    pub user: users::Model,
    pub ledger_id: Uuid,
    pub role: Role,
}

impl LedgerContext {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

async fn ledger_selector(parts: &mut Parts, state: &ServerState) -> Result<Uuid, ServerError> {
    if let Ok(Path(params)) =
        Path::<HashMap<String, String>>::from_request_parts(parts, state).await
        && let Some(raw) = params.get("ledger_id")
    {
        return Uuid::parse_str(raw)
            .map_err(|_| ServerError::Generic("invalid ledger id".to_string()));
    }

    match parts.headers.typed_try_get::<LedgerHeader>() {
        Ok(Some(LedgerHeader(ledger_id))) => Ok(ledger_id),
        Ok(None) => Err(ServerError::Generic(
            "missing X-Ledger-Id header".to_string(),
        )),
        Err(_) => Err(ServerError::Generic("invalid X-Ledger-Id header".to_string())),
    }
}

impl FromRequestParts<ServerState> for LedgerContext {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<users::Model>()
            .cloned()
            .ok_or(ServerError::Unauthorized)?;
        let ledger_id = ledger_selector(parts, state).await?;
        let access = state
            .engine
            .authorize(&user.id, ledger_id, Action::View)
            .await?;

        Ok(LedgerContext {
            user,
            ledger_id,
            role: access.role,
        })
    }
}
