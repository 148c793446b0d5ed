//! Ledger read operations.
//!
//! Pure reads: each call re-executes its query, so repeated calls with no
//! intervening writes return identical results. Pagination is newest → older
//! by `(created_at DESC, id DESC)` with an opaque base64 cursor.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{
    Actor, ActorRole, EngineError, ResultEngine, Transaction, TransactionKind, actors,
    transactions, util::parse_uuid, wallets,
};

use super::{
    Engine,
    access::{require_actor, require_role},
    with_tx,
};

/// Filters for listing ledger entries.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidAmount(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(EngineError::InvalidAmount(
            "kinds must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Wallet fields exposed when an admin listing is expanded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub balance: i64,
}

/// Actor fields exposed when an admin listing is expanded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// One admin-listing row: the entry, optionally expanded with summaries of
/// the wallets it references and the actor that initiated it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerRecord {
    pub transaction: Transaction,
    pub from_wallet: Option<WalletSummary>,
    pub to_wallet: Option<WalletSummary>,
    pub initiated_by: Option<ActorSummary>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ListCursor {
    created_at: DateTime<Utc>,
    transaction_id: String,
}

impl ListCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidAmount("invalid list cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidAmount("invalid list cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidAmount("invalid list cursor".to_string()))
    }
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
    fn apply_cursor(self, cursor: Option<&str>) -> ResultEngine<Self>;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::CreatedAt.lt(to));
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }
        self
    }

    fn apply_cursor(mut self, cursor: Option<&str>) -> ResultEngine<Self> {
        if let Some(cursor) = cursor {
            let cursor = ListCursor::decode(cursor)?;
            self = self.filter(
                Condition::any()
                    .add(transactions::Column::CreatedAt.lt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(transactions::Column::CreatedAt.eq(cursor.created_at))
                            .add(transactions::Column::Id.lt(cursor.transaction_id)),
                    ),
            );
        }
        Ok(self)
    }
}

fn next_cursor_for(page: &[Transaction], has_more: bool) -> ResultEngine<Option<String>> {
    if !has_more {
        return Ok(None);
    }
    page.last()
        .map(|tx| {
            ListCursor {
                created_at: tx.created_at,
                transaction_id: tx.id.to_string(),
            }
            .encode()
        })
        .transpose()
}

impl Engine {
    /// Lists the entries the caller is a party to: initiated by them, or
    /// debiting/crediting their wallet.
    pub async fn list_my_transactions(
        &self,
        actor: Option<Actor>,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        let actor = require_actor(actor)?;
        validate_list_filter(filter)?;

        with_tx!(self, |db_tx| {
            let mut scope = Condition::any()
                .add(transactions::Column::InitiatedBy.eq(actor.id.to_string()));
            if let Some(wallet) = self.find_wallet_by_owner(&db_tx, actor.id).await? {
                scope = scope
                    .add(transactions::Column::FromWalletId.eq(wallet.id.clone()))
                    .add(transactions::Column::ToWalletId.eq(wallet.id));
            }

            let limit_plus_one = limit.saturating_add(1);
            let rows: Vec<transactions::Model> = transactions::Entity::find()
                .filter(scope)
                .apply_tx_filters(filter)
                .apply_cursor(cursor)?
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one)
                .all(&db_tx)
                .await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<Transaction> = Vec::with_capacity(rows.len().min(limit as usize));
            for model in rows.into_iter().take(limit as usize) {
                out.push(Transaction::try_from(model)?);
            }

            let next_cursor = next_cursor_for(&out, has_more)?;
            Ok((out, next_cursor))
        })
    }

    /// Lists every ledger entry. Admin only.
    ///
    /// With `expand`, each row carries wallet summaries (owner, balance) and
    /// the initiating actor's summary; referenced records that no longer
    /// resolve are left unexpanded rather than failing the listing.
    pub async fn list_all_transactions(
        &self,
        actor: Option<Actor>,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
        expand: bool,
    ) -> ResultEngine<(Vec<LedgerRecord>, Option<String>)> {
        let actor = require_actor(actor)?;
        require_role(&actor, ActorRole::Admin)?;
        validate_list_filter(filter)?;

        with_tx!(self, |db_tx| {
            let limit_plus_one = limit.saturating_add(1);
            let rows: Vec<transactions::Model> = transactions::Entity::find()
                .apply_tx_filters(filter)
                .apply_cursor(cursor)?
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one)
                .all(&db_tx)
                .await?;
            let has_more = rows.len() > limit as usize;

            let mut page: Vec<Transaction> = Vec::with_capacity(rows.len().min(limit as usize));
            for model in rows.into_iter().take(limit as usize) {
                page.push(Transaction::try_from(model)?);
            }
            let next_cursor = next_cursor_for(&page, has_more)?;

            let (wallet_summaries, actor_summaries) = if expand {
                self.load_summaries(&db_tx, &page).await?
            } else {
                (HashMap::new(), HashMap::new())
            };

            let records = page
                .into_iter()
                .map(|tx| {
                    let from_wallet = tx
                        .from_wallet_id
                        .and_then(|id| wallet_summaries.get(&id).cloned());
                    let to_wallet = tx
                        .to_wallet_id
                        .and_then(|id| wallet_summaries.get(&id).cloned());
                    let initiated_by = actor_summaries.get(&tx.initiated_by).cloned();
                    LedgerRecord {
                        transaction: tx,
                        from_wallet,
                        to_wallet,
                        initiated_by,
                    }
                })
                .collect();

            Ok((records, next_cursor))
        })
    }

    async fn load_summaries(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        page: &[Transaction],
    ) -> ResultEngine<(
        HashMap<Uuid, WalletSummary>,
        HashMap<Uuid, ActorSummary>,
    )> {
        let wallet_ids: Vec<String> = page
            .iter()
            .flat_map(|tx| [tx.from_wallet_id, tx.to_wallet_id])
            .flatten()
            .map(|id| id.to_string())
            .collect();
        let actor_ids: Vec<String> = page.iter().map(|tx| tx.initiated_by.to_string()).collect();

        let mut wallet_summaries = HashMap::new();
        if !wallet_ids.is_empty() {
            let wallet_models: Vec<wallets::Model> = wallets::Entity::find()
                .filter(wallets::Column::Id.is_in(wallet_ids))
                .all(db_tx)
                .await?;
            for model in wallet_models {
                let id = parse_uuid(&model.id, "wallet")?;
                wallet_summaries.insert(
                    id,
                    WalletSummary {
                        id,
                        owner_id: parse_uuid(&model.owner_id, "actor")?,
                        balance: model.balance,
                    },
                );
            }
        }

        let mut actor_summaries = HashMap::new();
        if !actor_ids.is_empty() {
            let actor_models: Vec<actors::Model> = actors::Entity::find()
                .filter(actors::Column::Id.is_in(actor_ids))
                .all(db_tx)
                .await?;
            for model in actor_models {
                let id = parse_uuid(&model.id, "actor")?;
                actor_summaries.insert(
                    id,
                    ActorSummary {
                        id,
                        name: model.name,
                        email: model.email,
                    },
                );
            }
        }

        Ok((wallet_summaries, actor_summaries))
    }
}
