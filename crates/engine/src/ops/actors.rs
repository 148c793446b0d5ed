//! Administrative actor operations: listing and agent approval.

use sea_orm::{ActiveValue, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Actor, ActorRole, EngineError, ResultEngine, actors};

use super::{
    Engine,
    access::{require_actor, require_role},
    with_tx,
};

impl Engine {
    /// Lists every actor. Admin only.
    pub async fn list_actors(&self, actor: Option<Actor>) -> ResultEngine<Vec<Actor>> {
        let actor = require_actor(actor)?;
        require_role(&actor, ActorRole::Admin)?;
        with_tx!(self, |db_tx| {
            let models: Vec<actors::Model> = actors::Entity::find()
                .order_by_asc(actors::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                out.push(Actor::try_from(model)?);
            }
            Ok(out)
        })
    }

    /// Approves or suspends an agent. Admin only.
    ///
    /// The target must hold the agent role; the flag has no meaning for
    /// users or admins.
    pub async fn set_agent_approved(
        &self,
        actor: Option<Actor>,
        agent_id: Uuid,
        approved: bool,
    ) -> ResultEngine<Actor> {
        let actor = require_actor(actor)?;
        require_role(&actor, ActorRole::Admin)?;

        with_tx!(self, |db_tx| {
            let model = self.require_actor_by_id(&db_tx, agent_id).await?;
            if ActorRole::try_from(model.role.as_str())? != ActorRole::Agent {
                return Err(EngineError::InvalidRole("actor is not an agent".to_string()));
            }

            let active = actors::ActiveModel {
                id: ActiveValue::Set(model.id),
                is_approved: ActiveValue::Set(approved),
                ..Default::default()
            };
            let updated = active.update(&db_tx).await?;
            Ok(Actor::try_from(updated)?)
        })
    }
}
