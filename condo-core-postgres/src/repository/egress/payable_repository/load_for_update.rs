use async_trait::async_trait;
use condo_core_db::models::egress::PayableModel;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use sqlx::Postgres;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PayableRepositoryImpl;
use crate::utils::{lock_order, TryFromRow};

#[async_trait]
impl LoadForUpdate<Postgres, PayableModel> for PayableRepositoryImpl {
    async fn load_for_update(&self, ids: &[Uuid]) -> Result<Vec<Option<PayableModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ordered = lock_order(ids);
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM payable WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&ordered)
                .fetch_all(&mut **transaction)
                .await?
        };

        let mut item_map = HashMap::new();
        for row in rows {
            let item = PayableModel::try_from_row(&row)?;
            item_map.insert(item.id, item);
        }

        Ok(ids.iter().map(|id| item_map.get(id).cloned()).collect())
    }
}
