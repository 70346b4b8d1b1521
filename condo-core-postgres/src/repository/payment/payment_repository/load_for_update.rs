use async_trait::async_trait;
use condo_core_db::models::payment::PaymentModel;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use sqlx::Postgres;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PaymentRepositoryImpl;
use crate::utils::{lock_order, TryFromRow};

impl PaymentRepositoryImpl {
    async fn load_locked(
        &self,
        ids: &[Uuid],
        query: &'static str,
    ) -> Result<Vec<Option<PaymentModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ordered = lock_order(ids);
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query(query).bind(&ordered).fetch_all(&mut **transaction).await?
        };

        let mut item_map = HashMap::new();
        for row in rows {
            let item = PaymentModel::try_from_row(&row)?;
            item_map.insert(item.id, item);
        }

        Ok(ids.iter().map(|id| item_map.get(id).cloned()).collect())
    }

    /// Shared row locks: the payments cannot be cancelled until this transaction ends, but other
    /// readers are not blocked.
    pub async fn load_for_share(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Option<PaymentModel>>, Box<dyn Error + Send + Sync>> {
        self.load_locked(ids, "SELECT * FROM payment WHERE id = ANY($1) ORDER BY id FOR SHARE")
            .await
    }
}

#[async_trait]
impl LoadForUpdate<Postgres, PaymentModel> for PaymentRepositoryImpl {
    async fn load_for_update(&self, ids: &[Uuid]) -> Result<Vec<Option<PaymentModel>>, Box<dyn Error + Send + Sync>> {
        self.load_locked(ids, "SELECT * FROM payment WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .await
    }
}
