use async_trait::async_trait;
use condo_core_db::models::reconciliation::ReconciliationModel;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use sqlx::Postgres;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ReconciliationRepositoryImpl;
use crate::utils::lock_order;

#[async_trait]
impl LoadForUpdate<Postgres, ReconciliationModel> for ReconciliationRepositoryImpl {
    async fn load_for_update(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Option<ReconciliationModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ordered = lock_order(ids);
        let items = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query_as::<_, ReconciliationModel>(
                "SELECT * FROM reconciliation WHERE id = ANY($1) ORDER BY id FOR UPDATE",
            )
            .bind(&ordered)
            .fetch_all(&mut **transaction)
            .await?
        };

        let item_map: HashMap<Uuid, ReconciliationModel> =
            items.into_iter().map(|item| (item.id, item)).collect();
        Ok(ids.iter().map(|id| item_map.get(id).cloned()).collect())
    }
}
