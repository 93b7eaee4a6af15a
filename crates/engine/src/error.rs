//! The module contains the errors the engine can throw.
//!
//! Every variant maps to one failure class of the ledger access layer:
//!
//! - [`NotFound`] a ledger, membership or invitation is absent.
//! - [`Conflict`] duplicate membership or a second owner at creation time.
//! - [`Invariant`] the write would break the single-owner rule.
//! - [`Forbidden`] the role policy denies the action.
//! - [`Redemption`] an invitation cannot be redeemed, see [`RedemptionFailure`].
//! - [`OwnerMustTransfer`] the owner tried to leave or be removed.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`Conflict`]: EngineError::Conflict
//!  [`Invariant`]: EngineError::Invariant
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`Redemption`]: EngineError::Redemption
//!  [`OwnerMustTransfer`]: EngineError::OwnerMustTransfer
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

/// Why an invitation token could not be redeemed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedemptionFailure {
    NotFound,
    Expired,
    Exhausted,
    Revoked,
}

impl RedemptionFailure {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::Exhausted => "exhausted",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for RedemptionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invariant violated: {0}")]
    Invariant(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invitation cannot be redeemed: {0}")]
    Redemption(RedemptionFailure),
    #[error("The owner must transfer the ledger first")]
    OwnerMustTransfer,
    #[error("Invitation is already {0}")]
    AlreadyTerminal(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Invariant(a), Self::Invariant(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Redemption(a), Self::Redemption(b)) => a == b,
            (Self::OwnerMustTransfer, Self::OwnerMustTransfer) => true,
            (Self::AlreadyTerminal(a), Self::AlreadyTerminal(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Internal(a), Self::Internal(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
