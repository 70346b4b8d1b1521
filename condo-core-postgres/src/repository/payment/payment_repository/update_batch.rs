use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::payment::PaymentModel;
use condo_core_db::repository::update_batch::UpdateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PaymentRepositoryImpl;
use crate::repository::audit::insert_audit_link;

impl PaymentRepositoryImpl {
    /// Folio, amounts and dates are immutable; only the cancellation fields are written.
    pub(super) async fn update_batch_impl(
        &self,
        items: Vec<PaymentModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<PaymentModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut updated_items = Vec::with_capacity(items.len());
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut item in items {
            item.set_audit_log_id(audit_log_id);
            let result = sqlx::query(
                r#"
                UPDATE payment
                SET status = $2, cancellation_reason = $3, cancelled_by = $4, cancelled_at = $5,
                    audit_log_id = $6
                WHERE id = $1
                "#,
            )
            .bind(item.id)
            .bind(item.status)
            .bind(item.cancellation_reason.as_ref().map(|s| s.as_str()))
            .bind(item.cancelled_by)
            .bind(item.cancelled_at)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            if result.rows_affected() == 0 {
                return Err(format!("Payment {} does not exist", item.id).into());
            }

            insert_audit_link(transaction, audit_log_id, item.id, PaymentModel::ENTITY_TYPE).await?;
            updated_items.push(item);
        }

        Ok(updated_items)
    }
}

#[async_trait]
impl UpdateBatch<Postgres, PaymentModel> for PaymentRepositoryImpl {
    async fn update_batch(
        &self,
        items: Vec<PaymentModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<PaymentModel>, Box<dyn Error + Send + Sync>> {
        Self::update_batch_impl(self, items, audit_log_id).await
    }
}
