//! Command structs for engine operations.
//!
//! These types group parameters for the money-movement operations, keeping
//! call sites readable and avoiding long argument lists. Every command
//! carries the authenticated actor as an `Option`: the engine itself decides
//! what an absent or under-privileged actor means, rather than relying on a
//! middleware chain having filtered the request earlier.

use crate::Actor;

/// Credit the caller's own wallet (self-funding).
#[derive(Clone, Debug)]
pub struct AddMoneyCmd {
    pub actor: Option<Actor>,
    pub amount_minor: i64,
}

impl AddMoneyCmd {
    #[must_use]
    pub fn new(actor: impl Into<Option<Actor>>, amount_minor: i64) -> Self {
        Self {
            actor: actor.into(),
            amount_minor,
        }
    }
}

/// Debit the caller's own wallet.
#[derive(Clone, Debug)]
pub struct WithdrawCmd {
    pub actor: Option<Actor>,
    pub amount_minor: i64,
}

impl WithdrawCmd {
    #[must_use]
    pub fn new(actor: impl Into<Option<Actor>>, amount_minor: i64) -> Self {
        Self {
            actor: actor.into(),
            amount_minor,
        }
    }
}

/// Peer transfer to the wallet owned by the actor behind `receiver_email`.
#[derive(Clone, Debug)]
pub struct SendMoneyCmd {
    pub actor: Option<Actor>,
    pub amount_minor: i64,
    pub receiver_email: String,
}

impl SendMoneyCmd {
    #[must_use]
    pub fn new(
        actor: impl Into<Option<Actor>>,
        amount_minor: i64,
        receiver_email: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            amount_minor,
            receiver_email: receiver_email.into(),
        }
    }
}

/// Agent deposit into the wallet owned by the actor behind `user_email`.
#[derive(Clone, Debug)]
pub struct CashInCmd {
    pub actor: Option<Actor>,
    pub amount_minor: i64,
    pub user_email: String,
}

impl CashInCmd {
    #[must_use]
    pub fn new(
        actor: impl Into<Option<Actor>>,
        amount_minor: i64,
        user_email: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            amount_minor,
            user_email: user_email.into(),
        }
    }
}

/// Agent withdrawal from the wallet owned by the actor behind `user_email`.
///
/// The flat fee is debited from the user's wallet together with the amount
/// and credited to the agent's wallet as commission.
#[derive(Clone, Debug)]
pub struct CashOutCmd {
    pub actor: Option<Actor>,
    pub amount_minor: i64,
    pub user_email: String,
}

impl CashOutCmd {
    #[must_use]
    pub fn new(
        actor: impl Into<Option<Actor>>,
        amount_minor: i64,
        user_email: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            amount_minor,
            user_email: user_email.into(),
        }
    }
}
