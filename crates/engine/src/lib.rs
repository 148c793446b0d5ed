//! Wallet ledger & transaction engine.
//!
//! The engine moves value between per-actor wallets (self-funding,
//! withdrawal, peer transfer, agent cash-in/cash-out) and records every
//! movement as an immutable ledger entry. Each operation runs as one unit of
//! work: all reads, precondition checks, balance writes and the ledger append
//! share a single database transaction, so either everything commits or
//! nothing is observable.
//!
//! Authorization is part of the engine contract: commands carry the
//! authenticated actor as an `Option`, and the engine answers with
//! [`EngineError::NotAuthenticated`] / [`EngineError::NotAuthorized`] itself
//! instead of trusting an upstream middleware chain.

pub use actors::{Actor, ActorRole};
pub use commands::{AddMoneyCmd, CashInCmd, CashOutCmd, SendMoneyCmd, WithdrawCmd};
pub use error::EngineError;
pub use fees::{CASH_OUT_FEE_MINOR, FeeBreakdown, FeeRule, SEND_FEE_BPS, compute_fee};
pub use ops::{
    ActorSummary, AgentMovementReceipt, Engine, EngineBuilder, LedgerRecord, MovementReceipt,
    TransactionListFilter, WalletSummary,
};
pub use transactions::{Transaction, TransactionKind, TransactionStatus};
pub use wallets::Wallet;

mod actors;
mod commands;
mod error;
mod fees;
mod ops;
mod transactions;
mod util;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
