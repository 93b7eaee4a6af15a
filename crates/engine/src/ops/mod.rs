use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::{Currency, RandomTokens, ResultEngine, TokenSource};

mod access;
mod invitations;
mod ledgers;
mod members;

pub use access::AccessContext;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// The `write` form claims the database write lock before the block runs, so
/// checks and writes inside it never race another writer for the lock.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
    ($self:expr, write |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        crate::store::reserve_writer(&$tx).await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// What happens to a ledger's rows when its owner deletes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionMode {
    /// Stamp `deleted_at`, revoke invitations and drop memberships.
    #[default]
    Soft,
    /// Delete the ledger together with its memberships and invitations.
    Hard,
}

/// The ledger access service.
///
/// Every public method takes the acting user explicitly and runs its
/// authorization checks inside the same transaction as its writes.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    tokens: Arc<dyn TokenSource>,
    deletion: DeletionMode,
    default_currency: Currency,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn deletion_mode(&self) -> DeletionMode {
        self.deletion
    }
}

/// The builder for `Engine`
#[derive(Debug, Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    tokens: Option<Arc<dyn TokenSource>>,
    deletion: DeletionMode,
    default_currency: Currency,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the invitation token generator.
    pub fn token_source(mut self, tokens: Arc<dyn TokenSource>) -> EngineBuilder {
        self.tokens = Some(tokens);
        self
    }

    pub fn deletion(mut self, mode: DeletionMode) -> EngineBuilder {
        self.deletion = mode;
        self
    }

    /// Currency used when a ledger is created without one.
    pub fn default_currency(mut self, currency: Currency) -> EngineBuilder {
        self.default_currency = currency;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            tokens: self.tokens.unwrap_or_else(|| Arc::new(RandomTokens)),
            deletion: self.deletion,
            default_currency: self.default_currency,
        })
    }
}
