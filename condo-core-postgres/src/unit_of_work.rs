use std::sync::Arc;

use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;

/// Shared handle on the transaction of one unit of work.
///
/// Every repository built for the unit of work holds a clone, so all their statements run in the
/// same transaction. Dropping the last clone without committing rolls the transaction back.
#[derive(Clone)]
pub struct Executor {
    pub tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl Executor {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    pub async fn commit(&self) -> Result<(), sqlx::Error> {
        let transaction = self.tx.lock().await.take();
        match transaction {
            Some(transaction) => transaction.commit().await,
            None => Err(sqlx::Error::Configuration("Transaction has been consumed".into())),
        }
    }

    pub async fn rollback(&self) -> Result<(), sqlx::Error> {
        let transaction = self.tx.lock().await.take();
        match transaction {
            Some(transaction) => transaction.rollback().await,
            None => Ok(()),
        }
    }
}
