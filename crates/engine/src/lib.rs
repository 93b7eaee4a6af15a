//! Access control for shared ledgers.
//!
//! A ledger is shared between users through memberships carrying a role.
//! New members join by redeeming invitation tokens. [`Engine`] is the entry
//! point; every operation takes the acting user explicitly.

pub use currency::Currency;
pub use error::{EngineError, RedemptionFailure};
pub use invitation::{Invitation, InvitationStatus, NewInvitation};
pub use ledger::{Ledger, LedgerList, LedgerSummary, LedgerUpdate};
pub use membership::{Member, Membership};
pub use ops::{AccessContext, DeletionMode, Engine, EngineBuilder};
pub use policy::{Action, Role};
pub use store::{InvitationStore, MAX_TOKEN_ATTEMPTS, MembershipStore};
pub use token::{RandomTokens, TOKEN_LEN, TokenSource};

mod currency;
mod error;
mod ops;
mod policy;
mod util;

pub mod invitation;
pub mod ledger;
pub mod membership;
pub mod store;
pub mod token;
pub mod users;

pub type ResultEngine<T> = Result<T, EngineError>;
