use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::egress::PayableModel;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PayableRepositoryImpl;
use crate::repository::audit::insert_audit_link;

impl PayableRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &PayableRepositoryImpl,
        items: Vec<PayableModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<PayableModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut saved_items = Vec::with_capacity(items.len());
        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut item in items {
            item.set_audit_log_id(audit_log_id);
            sqlx::query(
                r#"
                INSERT INTO payable (
                    id, tenant_id, supplier, concept, due_date, total_amount, paid_amount,
                    balance, status, created_at, audit_log_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(item.id)
            .bind(item.tenant_id)
            .bind(item.supplier.as_str())
            .bind(item.concept.as_str())
            .bind(item.due_date)
            .bind(item.total_amount)
            .bind(item.paid_amount)
            .bind(item.balance)
            .bind(item.status)
            .bind(item.created_at)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            insert_audit_link(transaction, audit_log_id, item.id, PayableModel::ENTITY_TYPE).await?;
            saved_items.push(item);
        }

        Ok(saved_items)
    }
}

#[async_trait]
impl CreateBatch<Postgres, PayableModel> for PayableRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<PayableModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<PayableModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items, audit_log_id).await
    }
}
