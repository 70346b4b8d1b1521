use async_trait::async_trait;
use condo_core_db::models::payment::PaymentAllocationModel;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PaymentAllocationRepositoryImpl;

impl PaymentAllocationRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &PaymentAllocationRepositoryImpl,
        items: Vec<PaymentAllocationModel>,
    ) -> Result<Vec<PaymentAllocationModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO payment_allocation (id, payment_id, charge_id, amount_allocated, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(item.id)
            .bind(item.payment_id)
            .bind(item.charge_id)
            .bind(item.amount_allocated)
            .bind(item.created_at)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(items)
    }
}

/// Allocation rows belong to their payment; the payment's audit link covers them.
#[async_trait]
impl CreateBatch<Postgres, PaymentAllocationModel> for PaymentAllocationRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<PaymentAllocationModel>,
        _audit_log_id: Uuid,
    ) -> Result<Vec<PaymentAllocationModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items).await
    }
}
