use async_trait::async_trait;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::models::billing::ChargeModel;
use condo_core_db::repository::update_batch::UpdateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ChargeRepositoryImpl;
use crate::repository::audit::insert_audit_link;

impl ChargeRepositoryImpl {
    /// Only the settlement state and cancellation reason of a charge change after insert.
    pub(super) async fn update_batch_impl(
        &self,
        items: Vec<ChargeModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<ChargeModel>, Box<dyn Error + Send + Sync>> {
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
                UPDATE charge
                SET paid_amount = $2, balance = $3, status = $4, cancellation_reason = $5,
                    audit_log_id = $6
                WHERE id = $1
                "#,
            )
            .bind(item.id)
            .bind(item.paid_amount)
            .bind(item.balance)
            .bind(item.status)
            .bind(item.cancellation_reason.as_ref().map(|s| s.as_str()))
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            if result.rows_affected() == 0 {
                return Err(format!("Charge {} does not exist", item.id).into());
            }

            insert_audit_link(transaction, audit_log_id, item.id, ChargeModel::ENTITY_TYPE).await?;
            updated_items.push(item);
        }

        Ok(updated_items)
    }
}

#[async_trait]
impl UpdateBatch<Postgres, ChargeModel> for ChargeRepositoryImpl {
    async fn update_batch(
        &self,
        items: Vec<ChargeModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<ChargeModel>, Box<dyn Error + Send + Sync>> {
        Self::update_batch_impl(self, items, audit_log_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_utils::create_test_charge;
    use crate::test_helper::{create_test_audit_log, setup_test_context};
    use condo_core_api::domain::settlement::{apply_settlement, SettlementStatus};
    use condo_core_db::repository::{
        create_batch::CreateBatch, load_for_update::LoadForUpdate, update_batch::UpdateBatch,
    };
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_update_batch_persists_settlement() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let audit_log = create_test_audit_log(repos).await?;
        let charge = create_test_charge(Uuid::new_v4(), Uuid::new_v4(), dec!(100.00));
        repos.charge_repository.create_batch(vec![charge.clone()], audit_log.id).await?;

        let mut locked = repos.charge_repository.load_for_update(&[charge.id]).await?;
        let mut locked = locked.remove(0).ok_or("charge missing")?;
        apply_settlement(&mut locked, dec!(100.00))?;
        repos.charge_repository.update_batch(vec![locked], audit_log.id).await?;

        let reloaded = repos.charge_repository.load_for_update(&[charge.id]).await?;
        let reloaded = reloaded[0].as_ref().ok_or("charge missing")?;
        assert_eq!(reloaded.status, SettlementStatus::Paid);
        assert_eq!(reloaded.balance, dec!(0));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_of_missing_charge_fails() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let charge = create_test_charge(Uuid::new_v4(), Uuid::new_v4(), dec!(10.00));
        let result = ctx.repos().charge_repository.update_batch(vec![charge], Uuid::new_v4()).await;
        assert!(result.is_err());
        Ok(())
    }
}
