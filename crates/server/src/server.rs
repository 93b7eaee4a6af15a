use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::{net::SocketAddr, sync::Arc};

use crate::{invitations, ledgers, members};
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    /// Base URL invitation links are built on.
    pub public_url: String,
}

impl ServerState {
    pub fn new(engine: Engine, db: DatabaseConnection, public_url: impl Into<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            db,
            public_url: public_url.into(),
        }
    }
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<users::Model> = users::Entity::find()
        .filter(users::Column::Username.eq(auth_header.username()))
        .filter(users::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to load user: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/ledgers",
            get(ledgers::list).post(ledgers::create),
        )
        .route("/ledgers/current", get(ledgers::get))
        .route(
            "/ledgers/{ledger_id}",
            get(ledgers::get).put(ledgers::update).delete(ledgers::delete),
        )
        .route("/ledgers/{ledger_id}/default", put(ledgers::set_default))
        .route("/ledgers/{ledger_id}/members", get(members::list))
        .route(
            "/ledgers/{ledger_id}/members/me",
            axum::routing::delete(members::quit),
        )
        .route(
            "/ledgers/{ledger_id}/members/{user_id}",
            axum::routing::delete(members::remove),
        )
        .route(
            "/ledgers/{ledger_id}/members/{user_id}/role",
            put(members::change_role),
        )
        .route("/ledgers/{ledger_id}/owner", post(members::transfer_ownership))
        .route(
            "/ledgers/{ledger_id}/invitations",
            get(invitations::list).post(invitations::create),
        )
        .route(
            "/ledgers/{ledger_id}/invitations/{token}",
            axum::routing::delete(invitations::revoke),
        )
        .route("/invitations/{token}/join", post(invitations::join))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(state: ServerState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_with_listener(state, listener).await
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
