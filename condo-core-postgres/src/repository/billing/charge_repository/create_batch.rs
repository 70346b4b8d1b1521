use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::billing::ChargeModel;
use condo_core_db::repository::create_batch::CreateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ChargeRepositoryImpl;
use crate::repository::audit::insert_audit_link;

impl ChargeRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &ChargeRepositoryImpl,
        items: Vec<ChargeModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<ChargeModel>, Box<dyn Error + Send + Sync>> {
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
                INSERT INTO charge (
                    id, tenant_id, unit_id, charge_type, concept, period, due_date,
                    total_amount, paid_amount, balance, status, cancellation_reason,
                    created_at, audit_log_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(item.id)
            .bind(item.tenant_id)
            .bind(item.unit_id)
            .bind(item.charge_type)
            .bind(item.concept.as_str())
            .bind(item.period.as_str())
            .bind(item.due_date)
            .bind(item.total_amount)
            .bind(item.paid_amount)
            .bind(item.balance)
            .bind(item.status)
            .bind(item.cancellation_reason.as_ref().map(|s| s.as_str()))
            .bind(item.created_at)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            insert_audit_link(transaction, audit_log_id, item.id, ChargeModel::ENTITY_TYPE).await?;
            saved_items.push(item);
        }

        Ok(saved_items)
    }
}

#[async_trait]
impl CreateBatch<Postgres, ChargeModel> for ChargeRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<ChargeModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<ChargeModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items, audit_log_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_utils::create_test_charge;
    use crate::test_helper::{create_test_audit_log, setup_test_context};
    use condo_core_db::repository::create_batch::CreateBatch;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_create_batch_links_every_charge_to_the_audit_log(
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let audit_log = create_test_audit_log(repos).await?;

        let tenant_id = Uuid::new_v4();
        let charges: Vec<_> = (0..3)
            .map(|_| create_test_charge(tenant_id, Uuid::new_v4(), dec!(850.00)))
            .collect();
        let saved = repos.charge_repository.create_batch(charges, audit_log.id).await?;

        assert_eq!(saved.len(), 3);
        assert!(saved.iter().all(|c| c.audit_log_id == Some(audit_log.id)));

        let links = repos.audit_link_repository.find_by_audit_log_id(audit_log.id).await?;
        assert_eq!(links.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_batch_empty() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let saved = ctx
            .repos()
            .charge_repository
            .create_batch(Vec::new(), Uuid::new_v4())
            .await?;
        assert!(saved.is_empty());
        Ok(())
    }
}
