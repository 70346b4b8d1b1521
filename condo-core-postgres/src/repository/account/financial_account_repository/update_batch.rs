use async_trait::async_trait;
use condo_core_db::models::account::FinancialAccountModel;
use condo_core_db::models::auditable::Auditable;
use condo_core_db::repository::update_batch::UpdateBatch;
use sqlx::Postgres;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::FinancialAccountRepositoryImpl;
use crate::repository::audit::insert_audit_link;

#[async_trait]
impl UpdateBatch<Postgres, FinancialAccountModel> for FinancialAccountRepositoryImpl {
    async fn update_batch(
        &self,
        items: Vec<FinancialAccountModel>,
        audit_log_id: Uuid,
    ) -> Result<Vec<FinancialAccountModel>, Box<dyn Error + Send + Sync>> {
        let mut updated_items = Vec::with_capacity(items.len());
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut item in items {
            item.set_audit_log_id(audit_log_id);
            let result = sqlx::query(
                "UPDATE financial_account SET current_balance = $2, audit_log_id = $3 WHERE id = $1",
            )
            .bind(item.id)
            .bind(item.current_balance)
            .bind(item.audit_log_id)
            .execute(&mut **transaction)
            .await?;

            if result.rows_affected() == 0 {
                return Err(format!("Financial account {} does not exist", item.id).into());
            }

            insert_audit_link(transaction, audit_log_id, item.id, FinancialAccountModel::ENTITY_TYPE).await?;
            updated_items.push(item);
        }

        Ok(updated_items)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helper::{create_test_account, create_test_audit_log, setup_test_context};
    use condo_core_db::repository::load_for_update::LoadForUpdate;
    use condo_core_db::repository::update_batch::UpdateBatch;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_update_batch_moves_current_balance() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let account = create_test_account(repos, Uuid::new_v4(), dec!(1000.00)).await?;

        let mut locked = repos
            .financial_account_repository
            .load_for_update(&[account.id])
            .await?
            .remove(0)
            .ok_or("account missing")?;
        locked.record_inflow(dec!(250.50));
        let audit_log = create_test_audit_log(repos).await?;
        repos.financial_account_repository.update_batch(vec![locked], audit_log.id).await?;

        let reloaded = repos
            .financial_account_repository
            .find_by_id(account.id)
            .await?
            .ok_or("account missing")?;
        assert_eq!(reloaded.current_balance, dec!(1250.50));
        assert_eq!(reloaded.opening_balance, dec!(1000.00));
        assert_eq!(reloaded.audit_log_id, Some(audit_log.id));

        Ok(())
    }
}
