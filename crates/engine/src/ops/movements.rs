//! Money-movement operations.
//!
//! Each operation is one unit of work: every read, balance check, wallet
//! write and the ledger append happen inside a single database transaction,
//! committed only after all of them succeeded. Preconditions run in a fixed
//! order so a failing call always reports the same single cause.

use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{
    ActorRole, AddMoneyCmd, CashInCmd, CashOutCmd, EngineError, ResultEngine, SendMoneyCmd,
    Transaction, TransactionKind, WithdrawCmd,
    fees::{FeeBreakdown, compute_fee},
    transactions, util::parse_uuid, wallets,
};

use super::{
    Engine,
    access::{require_actor, require_approved_agent, require_positive_amount, require_role},
    with_tx,
};

/// Outcome of a self-operation: the committed ledger entry plus the caller's
/// wallet balance after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementReceipt {
    pub transaction: Transaction,
    pub new_balance: i64,
}

/// Outcome of an agent-mediated operation; the balance reported is the
/// serviced user's, not the agent's.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentMovementReceipt {
    pub transaction: Transaction,
    pub new_user_balance: i64,
}

fn checked_total(amount_minor: i64, fee_minor: i64) -> ResultEngine<i64> {
    amount_minor
        .checked_add(fee_minor)
        .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
}

fn credited_balance(balance: i64, amount_minor: i64) -> ResultEngine<i64> {
    balance
        .checked_add(amount_minor)
        .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
}

impl Engine {
    async fn store_wallet_balance(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: &str,
        new_balance: i64,
    ) -> ResultEngine<()> {
        let wallet_model = wallets::ActiveModel {
            id: ActiveValue::Set(wallet_id.to_string()),
            balance: ActiveValue::Set(new_balance),
            ..Default::default()
        };
        wallet_model.update(db_tx).await?;
        Ok(())
    }

    async fn append_entry(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        transactions::ActiveModel::from(tx).insert(db_tx).await?;
        Ok(())
    }

    /// Credits the caller's own wallet.
    pub async fn add_money(&self, cmd: AddMoneyCmd) -> ResultEngine<MovementReceipt> {
        let AddMoneyCmd {
            actor,
            amount_minor,
        } = cmd;
        let actor = require_actor(actor)?;
        require_role(&actor, ActorRole::User)?;
        require_positive_amount(amount_minor)?;
        let created_at = Utc::now();

        with_tx!(self, |db_tx| {
            let wallet = self
                .require_active_wallet_by_owner(&db_tx, actor.id, "wallet")
                .await?;
            let new_balance = credited_balance(wallet.balance, amount_minor)?;
            self.store_wallet_balance(&db_tx, &wallet.id, new_balance)
                .await?;

            // Ledger convention: `add` records the credited wallet in
            // `from_wallet_id`; `to_wallet_id` stays empty.
            let tx = Transaction::new(
                TransactionKind::Add,
                amount_minor,
                FeeBreakdown::none(),
                Some(parse_uuid(&wallet.id, "wallet")?),
                None,
                actor.id,
                created_at,
            )?;
            self.append_entry(&db_tx, &tx).await?;

            Ok(MovementReceipt {
                transaction: tx,
                new_balance,
            })
        })
    }

    /// Debits the caller's own wallet.
    pub async fn withdraw(&self, cmd: WithdrawCmd) -> ResultEngine<MovementReceipt> {
        let WithdrawCmd {
            actor,
            amount_minor,
        } = cmd;
        let actor = require_actor(actor)?;
        require_role(&actor, ActorRole::User)?;
        require_positive_amount(amount_minor)?;
        let created_at = Utc::now();

        with_tx!(self, |db_tx| {
            let wallet = self
                .require_active_wallet_by_owner(&db_tx, actor.id, "wallet")
                .await?;
            if wallet.balance < amount_minor {
                return Err(EngineError::InsufficientFunds(
                    "balance below requested amount".to_string(),
                ));
            }
            let new_balance = wallet.balance - amount_minor;
            self.store_wallet_balance(&db_tx, &wallet.id, new_balance)
                .await?;

            let tx = Transaction::new(
                TransactionKind::Withdraw,
                amount_minor,
                FeeBreakdown::none(),
                Some(parse_uuid(&wallet.id, "wallet")?),
                None,
                actor.id,
                created_at,
            )?;
            self.append_entry(&db_tx, &tx).await?;

            Ok(MovementReceipt {
                transaction: tx,
                new_balance,
            })
        })
    }

    /// Peer transfer: debits the sender by amount + fee, credits the receiver
    /// by the amount.
    ///
    /// The fee is a pure deduction. It is not routed to any wallet, so the
    /// sum of balances shrinks by the fee on every transfer.
    pub async fn send_money(&self, cmd: SendMoneyCmd) -> ResultEngine<MovementReceipt> {
        let SendMoneyCmd {
            actor,
            amount_minor,
            receiver_email,
        } = cmd;
        let actor = require_actor(actor)?;
        require_role(&actor, ActorRole::User)?;
        require_positive_amount(amount_minor)?;
        let created_at = Utc::now();

        with_tx!(self, |db_tx| {
            let sender_wallet = self
                .require_active_wallet_by_owner(&db_tx, actor.id, "wallet")
                .await?;

            let fee = compute_fee(TransactionKind::Send, amount_minor);
            let total = checked_total(amount_minor, fee.fee_minor)?;
            if sender_wallet.balance < total {
                return Err(EngineError::InsufficientFunds(
                    "balance below amount plus fee".to_string(),
                ));
            }

            let receiver = self
                .require_actor_by_email(&db_tx, &receiver_email, "receiver")
                .await?;
            let receiver_id = parse_uuid(&receiver.id, "actor")?;
            let receiver_wallet = self
                .require_active_wallet_by_owner(&db_tx, receiver_id, "receiver wallet")
                .await?;
            if receiver_wallet.id == sender_wallet.id {
                return Err(EngineError::InvalidAmount(
                    "sender and receiver wallet must differ".to_string(),
                ));
            }

            let new_sender_balance = sender_wallet.balance - total;
            let new_receiver_balance = credited_balance(receiver_wallet.balance, amount_minor)?;
            self.store_wallet_balance(&db_tx, &sender_wallet.id, new_sender_balance)
                .await?;
            self.store_wallet_balance(&db_tx, &receiver_wallet.id, new_receiver_balance)
                .await?;

            let tx = Transaction::new(
                TransactionKind::Send,
                amount_minor,
                fee,
                Some(parse_uuid(&sender_wallet.id, "wallet")?),
                Some(parse_uuid(&receiver_wallet.id, "wallet")?),
                actor.id,
                created_at,
            )?;
            self.append_entry(&db_tx, &tx).await?;

            Ok(MovementReceipt {
                transaction: tx,
                new_balance: new_sender_balance,
            })
        })
    }

    /// Agent deposit: credits the serviced user's wallet. No fee.
    pub async fn cash_in(&self, cmd: CashInCmd) -> ResultEngine<AgentMovementReceipt> {
        let CashInCmd {
            actor,
            amount_minor,
            user_email,
        } = cmd;
        let actor = require_actor(actor)?;
        require_approved_agent(&actor)?;
        require_positive_amount(amount_minor)?;
        let created_at = Utc::now();

        with_tx!(self, |db_tx| {
            self.require_active_wallet_by_owner(&db_tx, actor.id, "agent wallet")
                .await?;

            let user = self
                .require_actor_by_email(&db_tx, &user_email, "user")
                .await?;
            let user_id = parse_uuid(&user.id, "actor")?;
            let user_wallet = self
                .require_active_wallet_by_owner(&db_tx, user_id, "user wallet")
                .await?;

            let new_user_balance = credited_balance(user_wallet.balance, amount_minor)?;
            self.store_wallet_balance(&db_tx, &user_wallet.id, new_user_balance)
                .await?;

            let tx = Transaction::new(
                TransactionKind::CashIn,
                amount_minor,
                FeeBreakdown::none(),
                None,
                Some(parse_uuid(&user_wallet.id, "wallet")?),
                actor.id,
                created_at,
            )?;
            self.append_entry(&db_tx, &tx).await?;

            Ok(AgentMovementReceipt {
                transaction: tx,
                new_user_balance,
            })
        })
    }

    /// Agent withdrawal: debits the serviced user's wallet by amount + flat
    /// fee and credits the fee to the agent's wallet as commission.
    pub async fn cash_out(&self, cmd: CashOutCmd) -> ResultEngine<AgentMovementReceipt> {
        let CashOutCmd {
            actor,
            amount_minor,
            user_email,
        } = cmd;
        let actor = require_actor(actor)?;
        require_approved_agent(&actor)?;
        require_positive_amount(amount_minor)?;
        let created_at = Utc::now();

        with_tx!(self, |db_tx| {
            let agent_wallet = self
                .require_active_wallet_by_owner(&db_tx, actor.id, "agent wallet")
                .await?;

            let user = self
                .require_actor_by_email(&db_tx, &user_email, "user")
                .await?;
            let user_id = parse_uuid(&user.id, "actor")?;
            let user_wallet = self
                .require_active_wallet_by_owner(&db_tx, user_id, "user wallet")
                .await?;
            if user_wallet.id == agent_wallet.id {
                return Err(EngineError::InvalidAmount(
                    "agent and user wallet must differ".to_string(),
                ));
            }

            let fee = compute_fee(TransactionKind::CashOut, amount_minor);
            let total = checked_total(amount_minor, fee.fee_minor)?;
            if user_wallet.balance < total {
                return Err(EngineError::InsufficientFunds(
                    "user balance below amount plus fee".to_string(),
                ));
            }

            let new_user_balance = user_wallet.balance - total;
            let new_agent_balance = credited_balance(agent_wallet.balance, fee.fee_minor)?;
            self.store_wallet_balance(&db_tx, &user_wallet.id, new_user_balance)
                .await?;
            self.store_wallet_balance(&db_tx, &agent_wallet.id, new_agent_balance)
                .await?;

            let tx = Transaction::new(
                TransactionKind::CashOut,
                amount_minor,
                fee,
                Some(parse_uuid(&user_wallet.id, "wallet")?),
                Some(parse_uuid(&agent_wallet.id, "wallet")?),
                actor.id,
                created_at,
            )?;
            self.append_entry(&db_tx, &tx).await?;

            Ok(AgentMovementReceipt {
                transaction: tx,
                new_user_balance,
            })
        })
    }
}
