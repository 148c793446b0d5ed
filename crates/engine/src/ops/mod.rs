use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod actors;
mod list;
mod movements;
mod wallets;

pub use list::{ActorSummary, LedgerRecord, TransactionListFilter, WalletSummary};
pub use movements::{AgentMovementReceipt, MovementReceipt};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The wallet ledger engine.
///
/// Stateless apart from the database handle: every operation opens one
/// database transaction spanning all of its reads and writes, so two
/// operations touching the same wallet serialize on the store rather than on
/// an application lock.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
