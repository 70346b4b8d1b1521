use async_trait::async_trait;
use condo_core_db::models::reconciliation::ReconciliationItemModel;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ReconciliationItemRepositoryImpl;

impl ReconciliationItemRepositoryImpl {
    pub async fn find_by_reconciliation(
        &self,
        reconciliation_id: Uuid,
    ) -> Result<Vec<ReconciliationItemModel>, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let items = sqlx::query_as::<_, ReconciliationItemModel>(
            r#"
            SELECT id, reconciliation_id, payment_id, egress_id, amount, is_check_cashed
            FROM reconciliation_item
            WHERE reconciliation_id = $1
            ORDER BY payment_id NULLS LAST, egress_id
            "#,
        )
        .bind(reconciliation_id)
        .fetch_all(&mut **transaction)
        .await?;
        Ok(items)
    }
}

#[async_trait]
impl CreateBatch<Postgres, ReconciliationItemModel> for ReconciliationItemRepositoryImpl {
    /// Items are covered by the audit link of their reconciliation.
    async fn create_batch(
        &self,
        items: Vec<ReconciliationItemModel>,
        _audit_log_id: Uuid,
    ) -> Result<Vec<ReconciliationItemModel>, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO reconciliation_item (id, reconciliation_id, payment_id, egress_id, amount, is_check_cashed)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id)
            .bind(item.reconciliation_id)
            .bind(item.payment_id)
            .bind(item.egress_id)
            .bind(item.amount)
            .bind(item.is_check_cashed)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(items)
    }
}
