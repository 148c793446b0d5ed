//! The module contains the error the engine can throw.
//!
//! Every precondition failure aborts the in-flight database transaction
//! before any write, so an error here never leaves partial wallet or ledger
//! state behind. [`Database`] wraps any failure of the atomic unit to commit
//! (contention, connectivity); the engine never retries it, callers decide
//! whether to re-run the whole operation against fresh balances.
//!
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("wallet is blocked: {0}")]
    WalletBlocked(String),
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotAuthenticated(a), Self::NotAuthenticated(b)) => a == b,
            (Self::NotAuthorized(a), Self::NotAuthorized(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::WalletBlocked(a), Self::WalletBlocked(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
