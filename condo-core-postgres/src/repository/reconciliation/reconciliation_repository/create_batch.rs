use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::reconciliation::ReconciliationModel;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ReconciliationRepositoryImpl;
use crate::repository::audit::insert_audit_link;

#[async_trait]
impl CreateBatch<Postgres, ReconciliationModel> for ReconciliationRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<ReconciliationModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<ReconciliationModel>, Box<dyn Error + Send + Sync>> {
        let mut saved_items = Vec::with_capacity(items.len());
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut item in items {
            item.set_audit_log_id(audit_log_id);
            sqlx::query(
                r#"
                INSERT INTO reconciliation (
                    id, tenant_id, financial_account_id, cutoff_date, opening_balance,
                    closing_balance_bank, closing_balance_calculated, in_transit_total, difference,
                    status, hash, created_by, created_at, closed_by, closed_at, audit_log_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                "#,
            )
            .bind(item.id)
            .bind(item.tenant_id)
            .bind(item.financial_account_id)
            .bind(item.cutoff_date)
            .bind(item.opening_balance)
            .bind(item.closing_balance_bank)
            .bind(item.closing_balance_calculated)
            .bind(item.in_transit_total)
            .bind(item.difference)
            .bind(item.status)
            .bind(item.hash)
            .bind(item.created_by)
            .bind(item.created_at)
            .bind(item.closed_by)
            .bind(item.closed_at)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            insert_audit_link(transaction, audit_log_id, item.id, ReconciliationModel::ENTITY_TYPE).await?;
            saved_items.push(item);
        }

        Ok(saved_items)
    }
}
