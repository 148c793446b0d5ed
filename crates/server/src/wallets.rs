//! Wallet API endpoints.

use api_types::wallet::{WalletBlock, WalletView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, actors, server::ServerState};

fn wallet_view(wallet: engine::Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        owner_id: wallet.owner_id,
        balance_minor: wallet.balance,
        active: wallet.active,
        daily_limit: wallet.daily_limit,
        monthly_limit: wallet.monthly_limit,
        daily_amount_used: wallet.daily_amount_used,
        monthly_amount_used: wallet.monthly_amount_used,
        last_reset_date: wallet.last_reset_date,
        created_at: wallet.created_at,
    }
}

pub async fn get_my(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state
        .engine
        .wallet_by_owner(Some(actors::engine_actor(&actor)?))
        .await?;
    Ok(Json(wallet_view(wallet)))
}

pub async fn list(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<WalletView>>, ServerError> {
    let wallets = state
        .engine
        .list_wallets(Some(actors::engine_actor(&actor)?))
        .await?;
    Ok(Json(wallets.into_iter().map(wallet_view).collect()))
}

pub async fn block(
    Extension(actor): Extension<actors::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<WalletBlock>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state
        .engine
        .set_wallet_active(
            Some(actors::engine_actor(&actor)?),
            wallet_id,
            payload.active,
        )
        .await?;
    Ok(Json(wallet_view(wallet)))
}
