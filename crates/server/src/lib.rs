use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, RedemptionFailure};

pub use context::{LedgerContext, LedgerHeader};
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod context;
mod convert;
mod invitations;
mod ledgers;
mod members;
mod server;

pub mod types {
    pub mod ledger {
        pub use api_types::ledger::{LedgerCreated, LedgerList, LedgerNew, LedgerUpdate, LedgerView};
    }

    pub mod membership {
        pub use api_types::membership::{LedgerRole, MemberRoleUpdate, MemberView, OwnershipTransfer};
    }

    pub mod invitation {
        pub use api_types::invitation::{
            InvitationNew, InvitationStatus, InvitationView, JoinLedgerResponse,
        };
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Unauthorized,
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::Conflict(_)
        | EngineError::Invariant(_)
        | EngineError::OwnerMustTransfer
        | EngineError::AlreadyTerminal(_) => StatusCode::CONFLICT,
        EngineError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Redemption(RedemptionFailure::NotFound | RedemptionFailure::Revoked) => {
            StatusCode::NOT_FOUND
        }
        EngineError::Redemption(RedemptionFailure::Expired | RedemptionFailure::Exhausted) => {
            StatusCode::GONE
        }
        EngineError::Internal(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Internal(detail) => {
            tracing::error!("internal error: {detail}");
            "internal server error".to_string()
        }
        // Revoked and unknown tokens are indistinguishable to callers.
        EngineError::Redemption(RedemptionFailure::NotFound | RedemptionFailure::Revoked) => {
            "invitation is not valid".to_string()
        }
        EngineError::Redemption(RedemptionFailure::Expired) => "invitation has expired".to_string(),
        EngineError::Redemption(RedemptionFailure::Exhausted) => {
            "invitation has no uses left".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
