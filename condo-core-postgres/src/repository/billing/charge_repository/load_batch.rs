use async_trait::async_trait;
use condo_core_db::models::billing::ChargeModel;
use condo_core_db::repository::load_batch::LoadBatch;
use sqlx::Postgres;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ChargeRepositoryImpl;
use crate::utils::TryFromRow;

impl ChargeRepositoryImpl {
    pub(super) async fn load_batch_impl(
        repo: &ChargeRepositoryImpl,
        ids: &[Uuid],
    ) -> Result<Vec<Option<ChargeModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM charge WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&mut **transaction)
                .await?
        };

        let mut item_map = HashMap::new();
        for row in rows {
            let item = ChargeModel::try_from_row(&row)?;
            item_map.insert(item.id, item);
        }

        Ok(ids.iter().map(|id| item_map.get(id).cloned()).collect())
    }
}

#[async_trait]
impl LoadBatch<Postgres, ChargeModel> for ChargeRepositoryImpl {
    async fn load_batch(&self, ids: &[Uuid]) -> Result<Vec<Option<ChargeModel>>, Box<dyn Error + Send + Sync>> {
        Self::load_batch_impl(self, ids).await
    }
}
