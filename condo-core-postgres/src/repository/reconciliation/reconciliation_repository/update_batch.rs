use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::reconciliation::ReconciliationModel;
use condo_core_db::repository::update_batch::UpdateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ReconciliationRepositoryImpl;
use crate::repository::audit::insert_audit_link;

#[async_trait]
impl UpdateBatch<Postgres, ReconciliationModel> for ReconciliationRepositoryImpl {
    /// Snapshot figures are frozen at creation; closing only writes the status and who closed it.
    async fn update_batch(
        &self,
        items: Vec<ReconciliationModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<ReconciliationModel>, Box<dyn Error + Send + Sync>> {
        let mut updated_items = Vec::with_capacity(items.len());
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut item in items {
            item.set_audit_log_id(audit_log_id);
            let result = sqlx::query(
                r#"
                UPDATE reconciliation
                SET status = $2, closed_by = $3, closed_at = $4, audit_log_id = $5
                WHERE id = $1
                "#,
            )
            .bind(item.id)
            .bind(item.status)
            .bind(item.closed_by)
            .bind(item.closed_at)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            if result.rows_affected() == 0 {
                return Err(format!("Reconciliation {} does not exist", item.id).into());
            }

            insert_audit_link(transaction, audit_log_id, item.id, ReconciliationModel::ENTITY_TYPE).await?;
            updated_items.push(item);
        }

        Ok(updated_items)
    }
}
