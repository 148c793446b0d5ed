//! Money-movement and ledger-listing API endpoints.

use api_types::transaction::{
    ActorSummaryView, AddMoneyNew, AdminTransactionListResponse, AgentMovementCreated, CashInNew,
    CashOutNew, LedgerRecordView, MovementCreated, SendMoneyNew, TransactionList,
    TransactionListResponse, TransactionView, WalletSummaryView, WithdrawNew,
};
use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{ServerError, actors, server::ServerState};

fn map_kind(kind: engine::TransactionKind) -> api_types::TransactionKind {
    match kind {
        engine::TransactionKind::Add => api_types::TransactionKind::Add,
        engine::TransactionKind::Withdraw => api_types::TransactionKind::Withdraw,
        engine::TransactionKind::Send => api_types::TransactionKind::Send,
        engine::TransactionKind::CashIn => api_types::TransactionKind::CashIn,
        engine::TransactionKind::CashOut => api_types::TransactionKind::CashOut,
    }
}

fn unmap_kind(kind: api_types::TransactionKind) -> engine::TransactionKind {
    match kind {
        api_types::TransactionKind::Add => engine::TransactionKind::Add,
        api_types::TransactionKind::Withdraw => engine::TransactionKind::Withdraw,
        api_types::TransactionKind::Send => engine::TransactionKind::Send,
        api_types::TransactionKind::CashIn => engine::TransactionKind::CashIn,
        api_types::TransactionKind::CashOut => engine::TransactionKind::CashOut,
    }
}

fn map_status(status: engine::TransactionStatus) -> api_types::TransactionStatus {
    match status {
        engine::TransactionStatus::Pending => api_types::TransactionStatus::Pending,
        engine::TransactionStatus::Completed => api_types::TransactionStatus::Completed,
        engine::TransactionStatus::Failed => api_types::TransactionStatus::Failed,
    }
}

fn transaction_view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount_minor,
        fee_minor: tx.fee_minor,
        fee_type: tx.fee_rule.map(|rule| rule.kind_str().to_string()),
        fee_value: tx.fee_rule.map(engine::FeeRule::value),
        from_wallet_id: tx.from_wallet_id,
        to_wallet_id: tx.to_wallet_id,
        initiated_by: tx.initiated_by,
        status: map_status(tx.status),
        created_at: tx.created_at,
    }
}

fn list_filter(payload: &TransactionList) -> engine::TransactionListFilter {
    engine::TransactionListFilter {
        from: payload.from,
        to: payload.to,
        kinds: payload
            .kinds
            .as_ref()
            .map(|kinds| kinds.iter().copied().map(unmap_kind).collect()),
    }
}

pub async fn add_money(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AddMoneyNew>,
) -> Result<(StatusCode, Json<MovementCreated>), ServerError> {
    let receipt = state
        .engine
        .add_money(engine::AddMoneyCmd::new(
            actors::engine_actor(&actor)?,
            payload.amount_minor,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MovementCreated {
            transaction: transaction_view(receipt.transaction),
            new_balance: receipt.new_balance,
        }),
    ))
}

pub async fn withdraw(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WithdrawNew>,
) -> Result<(StatusCode, Json<MovementCreated>), ServerError> {
    let receipt = state
        .engine
        .withdraw(engine::WithdrawCmd::new(
            actors::engine_actor(&actor)?,
            payload.amount_minor,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MovementCreated {
            transaction: transaction_view(receipt.transaction),
            new_balance: receipt.new_balance,
        }),
    ))
}

pub async fn send_money(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SendMoneyNew>,
) -> Result<(StatusCode, Json<MovementCreated>), ServerError> {
    let receipt = state
        .engine
        .send_money(engine::SendMoneyCmd::new(
            actors::engine_actor(&actor)?,
            payload.amount_minor,
            payload.receiver_email,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MovementCreated {
            transaction: transaction_view(receipt.transaction),
            new_balance: receipt.new_balance,
        }),
    ))
}

pub async fn cash_in(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CashInNew>,
) -> Result<(StatusCode, Json<AgentMovementCreated>), ServerError> {
    let receipt = state
        .engine
        .cash_in(engine::CashInCmd::new(
            actors::engine_actor(&actor)?,
            payload.amount_minor,
            payload.user_email,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AgentMovementCreated {
            transaction: transaction_view(receipt.transaction),
            new_user_balance: receipt.new_user_balance,
        }),
    ))
}

pub async fn cash_out(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CashOutNew>,
) -> Result<(StatusCode, Json<AgentMovementCreated>), ServerError> {
    let receipt = state
        .engine
        .cash_out(engine::CashOutCmd::new(
            actors::engine_actor(&actor)?,
            payload.amount_minor,
            payload.user_email,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AgentMovementCreated {
            transaction: transaction_view(receipt.transaction),
            new_user_balance: receipt.new_user_balance,
        }),
    ))
}

pub async fn list_mine(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let limit = payload.limit.unwrap_or(50);
    let filter = list_filter(&payload);

    let (transactions, next_cursor) = state
        .engine
        .list_my_transactions(
            Some(actors::engine_actor(&actor)?),
            limit,
            payload.cursor.as_deref(),
            &filter,
        )
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: transactions.into_iter().map(transaction_view).collect(),
        next_cursor,
    }))
}

pub async fn list_all(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionList>,
) -> Result<Json<AdminTransactionListResponse>, ServerError> {
    let limit = payload.limit.unwrap_or(50);
    let expand = payload.expand.unwrap_or(false);
    let filter = list_filter(&payload);

    let (records, next_cursor) = state
        .engine
        .list_all_transactions(
            Some(actors::engine_actor(&actor)?),
            limit,
            payload.cursor.as_deref(),
            &filter,
            expand,
        )
        .await?;

    let transactions = records
        .into_iter()
        .map(|record| LedgerRecordView {
            transaction: transaction_view(record.transaction),
            from_wallet: record.from_wallet.map(|w| WalletSummaryView {
                id: w.id,
                owner_id: w.owner_id,
                balance_minor: w.balance,
            }),
            to_wallet: record.to_wallet.map(|w| WalletSummaryView {
                id: w.id,
                owner_id: w.owner_id,
                balance_minor: w.balance,
            }),
            initiated_by: record.initiated_by.map(|a| ActorSummaryView {
                id: a.id,
                name: a.name,
                email: a.email,
            }),
        })
        .collect();

    Ok(Json(AdminTransactionListResponse {
        transactions,
        next_cursor,
    }))
}
