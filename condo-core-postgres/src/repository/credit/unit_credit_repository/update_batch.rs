use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::credit::UnitCreditModel;
use condo_core_db::repository::update_batch::UpdateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::UnitCreditRepositoryImpl;
use crate::repository::audit::insert_audit_link;

#[async_trait]
impl UpdateBatch<Postgres, UnitCreditModel> for UnitCreditRepositoryImpl {
    /// Only the drawdown state of source entries is mutable.
    async fn update_batch(
        &self,
        items: Vec<UnitCreditModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<UnitCreditModel>, Box<dyn Error + Send + Sync>> {
        let mut updated_items = Vec::with_capacity(items.len());
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut item in items {
            item.set_audit_log_id(audit_log_id);
            let result = sqlx::query(
                r#"
                UPDATE unit_credit
                SET remaining_amount = $2, status = $3, audit_log_id = $4
                WHERE id = $1
                "#,
            )
            .bind(item.id)
            .bind(item.remaining_amount)
            .bind(item.status)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            if result.rows_affected() == 0 {
                return Err(format!("Credit entry {} does not exist", item.id).into());
            }

            insert_audit_link(transaction, audit_log_id, item.id, UnitCreditModel::ENTITY_TYPE).await?;
            updated_items.push(item);
        }

        Ok(updated_items)
    }
}
