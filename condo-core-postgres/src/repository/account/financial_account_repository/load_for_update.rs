use async_trait::async_trait;
use condo_core_db::models::account::FinancialAccountModel;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use sqlx::Postgres;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::FinancialAccountRepositoryImpl;
use crate::utils::{lock_order, TryFromRow};

impl FinancialAccountRepositoryImpl {
    /// Reads an account without locking it.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<FinancialAccountModel>, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let row = sqlx::query("SELECT * FROM financial_account WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await?;
        row.as_ref().map(FinancialAccountModel::try_from_row).transpose()
    }
}

#[async_trait]
impl LoadForUpdate<Postgres, FinancialAccountModel> for FinancialAccountRepositoryImpl {
    async fn load_for_update(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Option<FinancialAccountModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ordered = lock_order(ids);
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM financial_account WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&ordered)
                .fetch_all(&mut **transaction)
                .await?
        };

        let mut item_map = HashMap::new();
        for row in rows {
            let item = FinancialAccountModel::try_from_row(&row)?;
            item_map.insert(item.id, item);
        }

        Ok(ids.iter().map(|id| item_map.get(id).cloned()).collect())
    }
}
