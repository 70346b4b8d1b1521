use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::payment::PaymentModel;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PaymentRepositoryImpl;
use crate::repository::audit::insert_audit_link;

impl PaymentRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &PaymentRepositoryImpl,
        items: Vec<PaymentModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<PaymentModel>, Box<dyn Error + Send + Sync>> {
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
                INSERT INTO payment (
                    id, tenant_id, financial_account_id, unit_id, folio_rec, payment_date,
                    total_amount, allocated_amount, reference, status, cancellation_reason,
                    cancelled_by, cancelled_at, created_by, created_at, audit_log_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                "#,
            )
            .bind(item.id)
            .bind(item.tenant_id)
            .bind(item.financial_account_id)
            .bind(item.unit_id)
            .bind(item.folio_rec)
            .bind(item.payment_date)
            .bind(item.total_amount)
            .bind(item.allocated_amount)
            .bind(item.reference.as_ref().map(|s| s.as_str()))
            .bind(item.status)
            .bind(item.cancellation_reason.as_ref().map(|s| s.as_str()))
            .bind(item.cancelled_by)
            .bind(item.cancelled_at)
            .bind(item.created_by)
            .bind(item.created_at)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            insert_audit_link(transaction, audit_log_id, item.id, PaymentModel::ENTITY_TYPE).await?;
            saved_items.push(item);
        }

        Ok(saved_items)
    }
}

#[async_trait]
impl CreateBatch<Postgres, PaymentModel> for PaymentRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<PaymentModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<PaymentModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items, audit_log_id).await
    }
}
