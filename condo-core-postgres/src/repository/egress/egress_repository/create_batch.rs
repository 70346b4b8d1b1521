use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::egress::EgressModel;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::EgressRepositoryImpl;
use crate::repository::audit::insert_audit_link;

impl EgressRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &EgressRepositoryImpl,
        items: Vec<EgressModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<EgressModel>, Box<dyn Error + Send + Sync>> {
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
                INSERT INTO egress (
                    id, tenant_id, financial_account_id, folio_eg, egress_date, total_amount,
                    allocated_amount, check_number, reference, status, cancellation_reason,
                    cancelled_by, cancelled_at, created_by, created_at, audit_log_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                "#,
            )
            .bind(item.id)
            .bind(item.tenant_id)
            .bind(item.financial_account_id)
            .bind(item.folio_eg)
            .bind(item.egress_date)
            .bind(item.total_amount)
            .bind(item.allocated_amount)
            .bind(item.check_number.as_ref().map(|s| s.as_str()))
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

            insert_audit_link(transaction, audit_log_id, item.id, EgressModel::ENTITY_TYPE).await?;
            saved_items.push(item);
        }

        Ok(saved_items)
    }
}

#[async_trait]
impl CreateBatch<Postgres, EgressModel> for EgressRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<EgressModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<EgressModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items, audit_log_id).await
    }
}
