//! Request/response types for the walletd HTTP API.
//!
//! Pure data: no validation or business rules live here. Monetary values are
//! integer minor units throughout, matching the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    Add,
    Withdraw,
    Send,
    CashIn,
    CashOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    User,
    Agent,
    Admin,
}

pub mod actor {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterNew {
        pub name: String,
        pub email: String,
        pub password: String,
        /// `user` or `agent`; admins are not self-service.
        pub role: ActorRole,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ActorView {
        pub id: Uuid,
        pub name: String,
        pub email: String,
        pub role: ActorRole,
        pub active: bool,
        pub approved: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AgentApprove {
        pub approved: bool,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub owner_id: Uuid,
        pub balance_minor: i64,
        pub active: bool,
        pub daily_limit: i64,
        pub monthly_limit: i64,
        pub daily_amount_used: i64,
        pub monthly_amount_used: i64,
        pub last_reset_date: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletBlock {
        /// `false` blocks the wallet (and deactivates its owner), `true`
        /// unblocks it.
        pub active: bool,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AddMoneyNew {
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawNew {
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SendMoneyNew {
        pub amount_minor: i64,
        pub receiver_email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CashInNew {
        pub amount_minor: i64,
        pub user_email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CashOutNew {
        pub amount_minor: i64,
        pub user_email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub fee_minor: i64,
        pub fee_type: Option<String>,
        pub fee_value: Option<i64>,
        pub from_wallet_id: Option<Uuid>,
        pub to_wallet_id: Option<Uuid>,
        pub initiated_by: Uuid,
        pub status: TransactionStatus,
        pub created_at: DateTime<Utc>,
    }

    /// Response for self-operations (add, withdraw, send).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementCreated {
        pub transaction: TransactionView,
        pub new_balance: i64,
    }

    /// Response for agent-mediated operations (cash-in, cash-out).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AgentMovementCreated {
        pub transaction: TransactionView,
        pub new_user_balance: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub limit: Option<u64>,
        pub cursor: Option<String>,
        pub kinds: Option<Vec<TransactionKind>>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        /// Admin listing only: include wallet/actor summaries per entry.
        pub expand: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletSummaryView {
        pub id: Uuid,
        pub owner_id: Uuid,
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ActorSummaryView {
        pub id: Uuid,
        pub name: String,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerRecordView {
        pub transaction: TransactionView,
        pub from_wallet: Option<WalletSummaryView>,
        pub to_wallet: Option<WalletSummaryView>,
        pub initiated_by: Option<ActorSummaryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminTransactionListResponse {
        pub transactions: Vec<LedgerRecordView>,
        pub next_cursor: Option<String>,
    }
}
