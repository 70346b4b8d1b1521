use async_trait::async_trait;
use condo_core_db::models::billing::ChargeModel;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use sqlx::Postgres;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ChargeRepositoryImpl;
use crate::utils::{lock_order, TryFromRow};

impl ChargeRepositoryImpl {
    pub(super) async fn load_for_update_impl(
        repo: &ChargeRepositoryImpl,
        ids: &[Uuid],
    ) -> Result<Vec<Option<ChargeModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ordered = lock_order(ids);
        let rows = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM charge WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&ordered)
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
impl LoadForUpdate<Postgres, ChargeModel> for ChargeRepositoryImpl {
    async fn load_for_update(&self, ids: &[Uuid]) -> Result<Vec<Option<ChargeModel>>, Box<dyn Error + Send + Sync>> {
        Self::load_for_update_impl(self, ids).await
    }
}
