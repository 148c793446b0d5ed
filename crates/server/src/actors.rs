//! Actor entity, registration, and administrative actor endpoints.
//!
//! The server owns actor creation; the engine only assumes actors exist.
//! Registration therefore runs here and finishes with an explicit
//! `provision_wallet` call so every actor gets exactly one wallet without a
//! hidden creation hook.

use api_types::actor::{ActorView, AgentApprove, RegisterNew};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, entity::prelude::*};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "actors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub is_active: bool,
    pub is_approved: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn map_role(role: engine::ActorRole) -> api_types::ActorRole {
    match role {
        engine::ActorRole::User => api_types::ActorRole::User,
        engine::ActorRole::Agent => api_types::ActorRole::Agent,
        engine::ActorRole::Admin => api_types::ActorRole::Admin,
    }
}

pub fn actor_view(actor: engine::Actor) -> ActorView {
    ActorView {
        id: actor.id,
        name: actor.name,
        email: actor.email,
        role: map_role(actor.role),
        active: actor.active,
        approved: actor.approved,
    }
}

/// Convert the authenticated row into the engine's actor identity.
pub fn engine_actor(model: &Model) -> Result<engine::Actor, ServerError> {
    let id = Uuid::parse_str(&model.id)
        .map_err(|_| ServerError::Generic("invalid actor id".to_string()))?;
    let role = engine::ActorRole::try_from(model.role.as_str())?;
    Ok(engine::Actor {
        id,
        name: model.name.clone(),
        email: model.email.clone(),
        role,
        active: model.is_active,
        approved: model.is_approved,
    })
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterNew>,
) -> Result<(StatusCode, Json<ActorView>), ServerError> {
    let role = match payload.role {
        api_types::ActorRole::User => engine::ActorRole::User,
        api_types::ActorRole::Agent => engine::ActorRole::Agent,
        api_types::ActorRole::Admin => {
            return Err(ServerError::Generic(
                "admin accounts are not self-service".to_string(),
            ));
        }
    };

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() || payload.name.trim().is_empty() {
        return Err(ServerError::Generic(
            "name, email and password are required".to_string(),
        ));
    }

    let existing = Entity::find()
        .filter(Column::Email.eq(email.clone()))
        .one(&state.db)
        .await
        .map_err(engine::EngineError::from)?;
    if existing.is_some() {
        return Err(engine::EngineError::ExistingKey(email).into());
    }

    let id = Uuid::new_v4();
    let actor = ActiveModel {
        id: ActiveValue::Set(id.to_string()),
        name: ActiveValue::Set(payload.name.trim().to_string()),
        email: ActiveValue::Set(email),
        password: ActiveValue::Set(payload.password),
        role: ActiveValue::Set(role.as_str().to_string()),
        is_active: ActiveValue::Set(true),
        // Agents need an admin's approval before cash-in/cash-out.
        is_approved: ActiveValue::Set(false),
        created_at: ActiveValue::Set(Utc::now()),
    };
    let model = actor.insert(&state.db).await.map_err(engine::EngineError::from)?;

    state.engine.provision_wallet(id).await?;

    let view = actor_view(engine_actor(&model)?);
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list(
    Extension(actor): Extension<Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ActorView>>, ServerError> {
    let actors = state
        .engine
        .list_actors(Some(engine_actor(&actor)?))
        .await?;
    Ok(Json(actors.into_iter().map(actor_view).collect()))
}

pub async fn approve(
    Extension(actor): Extension<Model>,
    State(state): State<ServerState>,
    Path(agent_id): Path<Uuid>,
    Json(payload): Json<AgentApprove>,
) -> Result<Json<ActorView>, ServerError> {
    let updated = state
        .engine
        .set_agent_approved(Some(engine_actor(&actor)?), agent_id, payload.approved)
        .await?;
    Ok(Json(actor_view(updated)))
}
