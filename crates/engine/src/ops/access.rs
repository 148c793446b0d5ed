//! Authorization and precondition helpers.
//!
//! Access is decided here, inside the engine, not by a middleware chain: a
//! missing actor is `NotAuthenticated`, a wrong role or an unapproved agent
//! is `NotAuthorized`, and both are distinct from any business precondition
//! failure so the boundary can map them to different responses.

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{Actor, ActorRole, EngineError, ResultEngine, actors, wallets};

use super::Engine;

pub(super) fn require_actor(actor: Option<Actor>) -> ResultEngine<Actor> {
    actor.ok_or_else(|| EngineError::NotAuthenticated("missing actor identity".to_string()))
}

pub(super) fn require_role(actor: &Actor, role: ActorRole) -> ResultEngine<()> {
    if actor.role != role {
        return Err(EngineError::NotAuthorized(format!(
            "operation requires the {} role",
            role.as_str()
        )));
    }
    Ok(())
}

pub(super) fn require_approved_agent(actor: &Actor) -> ResultEngine<()> {
    require_role(actor, ActorRole::Agent)?;
    if !actor.approved {
        return Err(EngineError::NotAuthorized("agent not approved".to_string()));
    }
    Ok(())
}

/// Upstream validation is not trusted with money: amounts are re-checked at
/// the engine boundary.
pub(super) fn require_positive_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub(super) fn require_wallet_active(wallet: &wallets::Model, label: &str) -> ResultEngine<()> {
    if !wallet.is_active {
        return Err(EngineError::WalletBlocked(format!("{label} is blocked")));
    }
    Ok(())
}

impl Engine {
    pub(super) async fn find_wallet_by_owner(
        &self,
        db: &DatabaseTransaction,
        owner_id: Uuid,
    ) -> ResultEngine<Option<wallets::Model>> {
        wallets::Entity::find()
            .filter(wallets::Column::OwnerId.eq(owner_id.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_wallet_by_owner(
        &self,
        db: &DatabaseTransaction,
        owner_id: Uuid,
        label: &str,
    ) -> ResultEngine<wallets::Model> {
        self.find_wallet_by_owner(db, owner_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("{label} not exists")))
    }

    /// Fetch the owner's wallet and fail with [`EngineError::WalletBlocked`]
    /// if it is inactive. `label` distinguishes whose wallet the message
    /// refers to ("wallet", "receiver wallet", "agent wallet", "user wallet").
    pub(super) async fn require_active_wallet_by_owner(
        &self,
        db: &DatabaseTransaction,
        owner_id: Uuid,
        label: &str,
    ) -> ResultEngine<wallets::Model> {
        let wallet = self.require_wallet_by_owner(db, owner_id, label).await?;
        require_wallet_active(&wallet, label)?;
        Ok(wallet)
    }

    pub(super) async fn require_wallet_by_id(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<wallets::Model> {
        wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("wallet not exists".to_string()))
    }

    pub(super) async fn require_actor_by_id(
        &self,
        db: &DatabaseTransaction,
        actor_id: Uuid,
    ) -> ResultEngine<actors::Model> {
        actors::Entity::find_by_id(actor_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("actor not exists".to_string()))
    }

    pub(super) async fn require_actor_by_email(
        &self,
        db: &DatabaseTransaction,
        email: &str,
        label: &str,
    ) -> ResultEngine<actors::Model> {
        actors::Entity::find()
            .filter(actors::Column::Email.eq(email.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("{label} not exists")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn actor(role: ActorRole, approved: bool) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            name: "a".to_string(),
            email: "a@example.com".to_string(),
            role,
            active: true,
            approved,
        }
    }

    #[test]
    fn missing_actor_is_not_authenticated() {
        assert!(matches!(
            require_actor(None),
            Err(EngineError::NotAuthenticated(_))
        ));
    }

    #[test]
    fn wrong_role_is_not_authorized() {
        let agent = actor(ActorRole::Agent, true);
        assert!(matches!(
            require_role(&agent, ActorRole::User),
            Err(EngineError::NotAuthorized(_))
        ));
    }

    #[test]
    fn unapproved_agent_is_not_authorized() {
        let agent = actor(ActorRole::Agent, false);
        assert_eq!(
            require_approved_agent(&agent),
            Err(EngineError::NotAuthorized("agent not approved".to_string()))
        );
        assert!(require_approved_agent(&actor(ActorRole::Agent, true)).is_ok());
    }

    #[test]
    fn non_positive_amounts_are_invalid() {
        assert!(require_positive_amount(1).is_ok());
        for amount in [0, -5] {
            assert!(matches!(
                require_positive_amount(amount),
                Err(EngineError::InvalidAmount(_))
            ));
        }
    }
}
