//! The module contains the `Wallet` struct and its persistence entity.
//!
//! A wallet is the per-actor balance record: exactly one per actor, created
//! once through [`Engine::provision_wallet`] and never deleted. Its balance
//! is only ever changed inside an engine operation's database transaction.
//!
//! The usage-limit columns (`daily_limit`, `monthly_limit`, the `*_used`
//! counters and `last_reset_date`) are stored and surfaced on reads but no
//! operation currently reads or enforces them.
//!
//! [`Engine::provision_wallet`]: crate::Engine::provision_wallet

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// A wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wallet {
    /// Stable identifier, generated once at provisioning time.
    pub id: Uuid,
    /// Owning actor; unique per wallet.
    pub owner_id: Uuid,
    /// Balance in minor units. Never negative: every debit checks funds
    /// before applying.
    pub balance: i64,
    pub active: bool,
    pub daily_limit: i64,
    pub monthly_limit: i64,
    pub daily_amount_used: i64,
    pub monthly_amount_used: i64,
    pub last_reset_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// A fresh, empty, active wallet for `owner_id`.
    pub fn new(owner_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            balance: 0,
            active: true,
            daily_limit: 0,
            monthly_limit: 0,
            daily_amount_used: 0,
            monthly_amount_used: 0,
            last_reset_date: now,
            created_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub balance: i64,
    pub is_active: bool,
    pub daily_limit: i64,
    pub monthly_limit: i64,
    pub daily_amount_used: i64,
    pub monthly_amount_used: i64,
    pub last_reset_date: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::actors::Entity",
        from = "Column::OwnerId",
        to = "super::actors::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owner,
}

impl Related<super::actors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner_id: ActiveValue::Set(value.owner_id.to_string()),
            balance: ActiveValue::Set(value.balance),
            is_active: ActiveValue::Set(value.active),
            daily_limit: ActiveValue::Set(value.daily_limit),
            monthly_limit: ActiveValue::Set(value.monthly_limit),
            daily_amount_used: ActiveValue::Set(value.daily_amount_used),
            monthly_amount_used: ActiveValue::Set(value.monthly_amount_used),
            last_reset_date: ActiveValue::Set(value.last_reset_date),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            owner_id: parse_uuid(&model.owner_id, "actor")?,
            balance: model.balance,
            active: model.is_active,
            daily_limit: model.daily_limit,
            monthly_limit: model.monthly_limit,
            daily_amount_used: model.daily_amount_used,
            monthly_amount_used: model.monthly_amount_used,
            last_reset_date: model.last_reset_date,
            created_at: model.created_at,
        })
    }
}
