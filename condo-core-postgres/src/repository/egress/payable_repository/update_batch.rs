use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::egress::PayableModel;
use condo_core_db::repository::update_batch::UpdateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PayableRepositoryImpl;
use crate::repository::audit::insert_audit_link;

#[async_trait]
impl UpdateBatch<Postgres, PayableModel> for PayableRepositoryImpl {
    async fn update_batch(
        &self,
        items: Vec<PayableModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<PayableModel>, Box<dyn Error + Send + Sync>> {
        let mut updated_items = Vec::with_capacity(items.len());
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut item in items {
            item.set_audit_log_id(audit_log_id);
            let result = sqlx::query(
                r#"
                UPDATE payable
                SET paid_amount = $2, balance = $3, status = $4, audit_log_id = $5
                WHERE id = $1
                "#,
            )
            .bind(item.id)
            .bind(item.paid_amount)
            .bind(item.balance)
            .bind(item.status)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            if result.rows_affected() == 0 {
                return Err(format!("Payable {} does not exist", item.id).into());
            }

            insert_audit_link(transaction, audit_log_id, item.id, PayableModel::ENTITY_TYPE).await?;
            updated_items.push(item);
        }

        Ok(updated_items)
    }
}
