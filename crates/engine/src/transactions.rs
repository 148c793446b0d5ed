//! Ledger entry primitives.
//!
//! A `Transaction` is the immutable record of one completed value movement.
//! It is appended inside the same database transaction as the wallet balance
//! updates it describes and never mutated afterwards.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, FeeRule, ResultEngine, fees::FeeBreakdown, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    Add,
    Withdraw,
    Send,
    CashIn,
    CashOut,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Withdraw => "withdraw",
            Self::Send => "send",
            Self::CashIn => "cash-in",
            Self::CashOut => "cash-out",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "add" => Ok(Self::Add),
            "withdraw" => Ok(Self::Withdraw),
            "send" => Ok(Self::Send),
            "cash-in" => Ok(Self::CashIn),
            "cash-out" => Ok(Self::CashOut),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Lifecycle status of a ledger entry.
///
/// The engine only ever writes `Completed`: an entry exists iff its movement
/// committed. `Pending`/`Failed` are reserved for out-of-scope reconciliation
/// flows that would append entries without moving value in the same unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    /// Moved amount in minor units, always positive.
    pub amount_minor: i64,
    /// Fee charged on top of `amount_minor`; 0 for fee-free kinds.
    pub fee_minor: i64,
    /// Rule the fee was computed with; present iff the kind is fee-bearing.
    pub fee_rule: Option<FeeRule>,
    pub from_wallet_id: Option<Uuid>,
    pub to_wallet_id: Option<Uuid>,
    pub initiated_by: Uuid,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a completed entry, validating the amount the caller hands in.
    ///
    /// The engine does not trust upstream shape validation with money: a
    /// non-positive amount is rejected here again.
    pub fn new(
        kind: TransactionKind,
        amount_minor: i64,
        fee: FeeBreakdown,
        from_wallet_id: Option<Uuid>,
        to_wallet_id: Option<Uuid>,
        initiated_by: Uuid,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            amount_minor,
            fee_minor: fee.fee_minor,
            fee_rule: fee.rule,
            from_wallet_id,
            to_wallet_id,
            initiated_by,
            status: TransactionStatus::Completed,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub fee_minor: i64,
    pub fee_type: Option<String>,
    pub fee_value: Option<i64>,
    pub from_wallet_id: Option<String>,
    pub to_wallet_id: Option<String>,
    pub initiated_by: String,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            fee_minor: ActiveValue::Set(tx.fee_minor),
            fee_type: ActiveValue::Set(tx.fee_rule.map(|rule| rule.kind_str().to_string())),
            fee_value: ActiveValue::Set(tx.fee_rule.map(FeeRule::value)),
            from_wallet_id: ActiveValue::Set(tx.from_wallet_id.map(|id| id.to_string())),
            to_wallet_id: ActiveValue::Set(tx.to_wallet_id.map(|id| id.to_string())),
            initiated_by: ActiveValue::Set(tx.initiated_by.to_string()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let fee_rule = match (model.fee_type.as_deref(), model.fee_value) {
            (Some("percentage"), Some(bps)) => Some(FeeRule::Percentage { bps }),
            (Some("flat"), Some(amount_minor)) => Some(FeeRule::Flat { amount_minor }),
            (None, _) => None,
            (Some(other), _) => {
                return Err(EngineError::InvalidAmount(format!(
                    "invalid fee type: {other}"
                )));
            }
        };
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            fee_minor: model.fee_minor,
            fee_rule,
            from_wallet_id: model
                .from_wallet_id
                .as_deref()
                .map(|id| parse_uuid(id, "wallet"))
                .transpose()?,
            to_wallet_id: model
                .to_wallet_id
                .as_deref()
                .map(|id| parse_uuid(id, "wallet"))
                .transpose()?,
            initiated_by: parse_uuid(&model.initiated_by, "actor")?,
            status: TransactionStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}
