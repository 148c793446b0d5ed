//! Actors: the authenticated identities that initiate operations.
//!
//! The engine never creates actors; registration belongs to the boundary
//! layer. It does read them (to resolve transfer targets by email and to
//! gate privileged operations) and flips `is_active`/`is_approved` through
//! the administrative operations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    User,
    Agent,
    Admin,
}

impl ActorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for ActorRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            other => Err(EngineError::InvalidRole(format!(
                "invalid actor role: {other}"
            ))),
        }
    }
}

/// An authenticated actor, as handed to the engine by the boundary layer.
///
/// Commands carry `Option<Actor>`; the engine treats `None` as
/// [`EngineError::NotAuthenticated`] rather than trusting the caller to have
/// rejected anonymous requests already.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: ActorRole,
    pub active: bool,
    /// Only meaningful for agents; agents start unapproved.
    pub approved: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
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
pub enum Relation {
    #[sea_orm(has_one = "super::wallets::Entity")]
    Wallet,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Actor {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "actor")?,
            name: model.name,
            email: model.email,
            role: ActorRole::try_from(model.role.as_str())?,
            active: model.is_active,
            approved: model.is_approved,
        })
    }
}
