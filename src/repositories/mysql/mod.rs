//! MySQL backend - Unit of Work e repository su sqlx/MySQL
//!
//! Le query sono controllate a runtime (`sqlx::query_as::<_, T>`) invece che con le macro
//! `query!`, così la compilazione non richiede un database raggiungibile.

mod friend;
mod trip;
mod trip_invitation;
mod user;

use super::traits::{Executor, UnitOfWork};
use sqlx::pool::PoolConnection;
use sqlx::{Error, MySql, MySqlConnection, MySqlPool, Transaction};
use tracing::{debug, instrument};

// alias di tipo per il pool, per semplificare lo switch in caso in cui vogliamo usare un altro db
pub type PoolType = MySqlPool;

#[derive(Clone)]
pub struct MySqlStore {
    connection_pool: PoolType,
}

impl MySqlStore {
    pub fn new(connection_pool: PoolType) -> Self {
        Self { connection_pool }
    }
}

impl UnitOfWork for MySqlStore {
    type Executor = MySqlExecutor;

    #[instrument(skip(self))]
    async fn begin(&self) -> Result<MySqlExecutor, Error> {
        let tx = self.connection_pool.begin().await?;
        debug!("Transaction opened");
        Ok(MySqlExecutor::Transaction(tx))
    }

    async fn connect(&self) -> Result<MySqlExecutor, Error> {
        let conn = self.connection_pool.acquire().await?;
        Ok(MySqlExecutor::Connection(conn))
    }
}

/// Executor MySQL: connessione del pool oppure transazione aperta.
///
/// Se una `Transaction` viene droppata senza commit, sqlx esegue il rollback.
pub enum MySqlExecutor {
    Connection(PoolConnection<MySql>),
    Transaction(Transaction<'static, MySql>),
}

impl MySqlExecutor {
    fn conn(&mut self) -> &mut MySqlConnection {
        match self {
            MySqlExecutor::Connection(conn) => &mut **conn,
            MySqlExecutor::Transaction(tx) => &mut **tx,
        }
    }
}

impl Executor for MySqlExecutor {
    fn in_transaction(&self) -> bool {
        matches!(self, MySqlExecutor::Transaction(_))
    }

    async fn commit(self) -> Result<(), Error> {
        match self {
            MySqlExecutor::Transaction(tx) => {
                tx.commit().await?;
                debug!("Transaction committed");
                Ok(())
            }
            MySqlExecutor::Connection(_) => Ok(()),
        }
    }
}
