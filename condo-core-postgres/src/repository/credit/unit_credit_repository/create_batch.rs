use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::credit::UnitCreditModel;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::UnitCreditRepositoryImpl;
use crate::repository::audit::insert_audit_link;

impl UnitCreditRepositoryImpl {
    /// Appends entries in the given order. `running_balance` is stored as provided; the credit
    /// service computes it under the unit lock.
    pub(super) async fn create_batch_impl(
        repo: &UnitCreditRepositoryImpl,
        items: Vec<UnitCreditModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<UnitCreditModel>, Box<dyn Error + Send + Sync>> {
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
                INSERT INTO unit_credit (
                    id, tenant_id, unit_id, movement_type, origin, amount, remaining_amount,
                    running_balance, status, source_credit_id, charge_id, payment_id, reason,
                    created_by, created_at, audit_log_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                "#,
            )
            .bind(item.id)
            .bind(item.tenant_id)
            .bind(item.unit_id)
            .bind(item.movement_type)
            .bind(item.origin)
            .bind(item.amount)
            .bind(item.remaining_amount)
            .bind(item.running_balance)
            .bind(item.status)
            .bind(item.source_credit_id)
            .bind(item.charge_id)
            .bind(item.payment_id)
            .bind(item.reason.as_str())
            .bind(item.created_by)
            .bind(item.created_at)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            insert_audit_link(transaction, audit_log_id, item.id, UnitCreditModel::ENTITY_TYPE).await?;
            saved_items.push(item);
        }

        Ok(saved_items)
    }
}

#[async_trait]
impl CreateBatch<Postgres, UnitCreditModel> for UnitCreditRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<UnitCreditModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<UnitCreditModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items, audit_log_id).await
    }
}
