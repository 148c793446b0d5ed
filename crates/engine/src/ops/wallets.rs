//! Wallet provisioning, reads and administrative blocking.

use chrono::Utc;
use sea_orm::{ActiveValue, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Actor, ActorRole, EngineError, ResultEngine, Wallet, actors, wallets};

use super::{
    Engine,
    access::{require_actor, require_role},
    with_tx,
};

impl Engine {
    /// Creates the single wallet for a newly registered actor.
    ///
    /// Provisioning is an explicit step the actor-management collaborator
    /// invokes right after creating the actor; the money-movement operations
    /// assume the wallet already exists. Provisioning twice is an error.
    pub async fn provision_wallet(&self, actor_id: Uuid) -> ResultEngine<Uuid> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.require_actor_by_id(&db_tx, actor_id).await?;
            if self.find_wallet_by_owner(&db_tx, actor_id).await?.is_some() {
                return Err(EngineError::ExistingKey(format!(
                    "wallet for actor {actor_id}"
                )));
            }

            let wallet = Wallet::new(actor_id, now);
            let wallet_id = wallet.id;
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            Ok(wallet_id)
        })
    }

    /// Returns the caller's own wallet.
    pub async fn wallet_by_owner(&self, actor: Option<Actor>) -> ResultEngine<Wallet> {
        let actor = require_actor(actor)?;
        with_tx!(self, |db_tx| {
            let model = self
                .require_wallet_by_owner(&db_tx, actor.id, "wallet")
                .await?;
            Ok(Wallet::try_from(model)?)
        })
    }

    /// Lists every wallet. Admin only.
    pub async fn list_wallets(&self, actor: Option<Actor>) -> ResultEngine<Vec<Wallet>> {
        let actor = require_actor(actor)?;
        require_role(&actor, ActorRole::Admin)?;
        with_tx!(self, |db_tx| {
            let models: Vec<wallets::Model> = wallets::Entity::find()
                .order_by_asc(wallets::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(Wallet::try_from(model)?);
            }
            Ok(out)
        })
    }

    /// Blocks or unblocks a wallet. Admin only.
    ///
    /// Blocking also deactivates the owning actor, so the account cannot keep
    /// operating through a replacement wallet. Unblocking does not reactivate
    /// the actor; that stays a separate administrative decision.
    pub async fn set_wallet_active(
        &self,
        actor: Option<Actor>,
        wallet_id: Uuid,
        active: bool,
    ) -> ResultEngine<Wallet> {
        let actor = require_actor(actor)?;
        require_role(&actor, ActorRole::Admin)?;

        with_tx!(self, |db_tx| {
            let model = self.require_wallet_by_id(&db_tx, wallet_id).await?;
            let owner_id = model.owner_id.clone();

            let wallet_active = wallets::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                is_active: ActiveValue::Set(active),
                ..Default::default()
            };
            let updated = wallet_active.update(&db_tx).await?;

            if !active {
                let actor_active = actors::ActiveModel {
                    id: ActiveValue::Set(owner_id),
                    is_active: ActiveValue::Set(false),
                    ..Default::default()
                };
                actor_active.update(&db_tx).await?;
            }

            Ok(Wallet::try_from(updated)?)
        })
    }
}
