//! Fee policy.
//!
//! A pure table mapping `(operation kind, amount)` to the fee charged and the
//! rule that produced it. Amounts are integer minor units; percentage rates
//! are expressed in basis points so no floating point ever touches money.
//!
//! Fee table:
//! - `send`: 1% of the amount, paid by the sender on top of the amount.
//! - `cash-out`: flat 10.00, paid by the debited wallet and credited to the
//!   agent's wallet as commission.
//! - everything else: no fee.

use serde::{Deserialize, Serialize};

use crate::TransactionKind;

/// Fee rate for `send`, in basis points (100 bps = 1%).
pub const SEND_FEE_BPS: i64 = 100;

/// Flat fee for `cash-out`, in minor units.
pub const CASH_OUT_FEE_MINOR: i64 = 10_00;

/// The rule a fee was computed with, persisted next to the ledger entry so a
/// record stays explainable after the table changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FeeRule {
    /// Percentage of the amount, in basis points.
    Percentage { bps: i64 },
    /// Fixed amount in minor units, independent of the moved amount.
    Flat { amount_minor: i64 },
}

impl FeeRule {
    pub fn kind_str(self) -> &'static str {
        match self {
            Self::Percentage { .. } => "percentage",
            Self::Flat { .. } => "flat",
        }
    }

    /// The raw rate or flat value, as stored in the `fee_value` column.
    pub fn value(self) -> i64 {
        match self {
            Self::Percentage { bps } => bps,
            Self::Flat { amount_minor } => amount_minor,
        }
    }
}

/// Result of [`compute_fee`]: the charged amount plus the rule used, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub fee_minor: i64,
    pub rule: Option<FeeRule>,
}

impl FeeBreakdown {
    pub const fn none() -> Self {
        Self {
            fee_minor: 0,
            rule: None,
        }
    }
}

/// Computes the fee for one operation.
///
/// Pure and deterministic. Must be called with an already-validated positive
/// `amount_minor`; the result is never negative. Percentage fees truncate
/// toward zero (sub-cent remainders are not charged).
pub fn compute_fee(kind: TransactionKind, amount_minor: i64) -> FeeBreakdown {
    match kind {
        TransactionKind::Send => {
            let fee_minor = (i128::from(amount_minor) * i128::from(SEND_FEE_BPS) / 10_000) as i64;
            FeeBreakdown {
                fee_minor,
                rule: Some(FeeRule::Percentage { bps: SEND_FEE_BPS }),
            }
        }
        TransactionKind::CashOut => FeeBreakdown {
            fee_minor: CASH_OUT_FEE_MINOR,
            rule: Some(FeeRule::Flat {
                amount_minor: CASH_OUT_FEE_MINOR,
            }),
        },
        TransactionKind::Add | TransactionKind::Withdraw | TransactionKind::CashIn => {
            FeeBreakdown::none()
        }
    }
}
