use async_trait::async_trait;
use condo_core_db::models::egress::EgressAllocationModel;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::EgressAllocationRepositoryImpl;

impl EgressAllocationRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &EgressAllocationRepositoryImpl,
        items: Vec<EgressAllocationModel>,
    ) -> Result<Vec<EgressAllocationModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO egress_allocation (id, egress_id, payable_id, amount_allocated, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(item.id)
            .bind(item.egress_id)
            .bind(item.payable_id)
            .bind(item.amount_allocated)
            .bind(item.created_at)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(items)
    }
}

#[async_trait]
impl CreateBatch<Postgres, EgressAllocationModel> for EgressAllocationRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<EgressAllocationModel>,
        _audit_log_id: Uuid,
    ) -> Result<Vec<EgressAllocationModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items).await
    }
}
