use async_trait::async_trait;
use condo_core_api::domain::credit::CreditStatus;
use condo_core_db::models::credit::UnitCreditModel;
use condo_core_db::repository::load_for_update::LoadForUpdate;
use sqlx::Postgres;
use std::collections::HashMap;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::UnitCreditRepositoryImpl;
use crate::utils::{lock_order, TryFromRow};

impl UnitCreditRepositoryImpl {
    /// Locks every active source of a unit, oldest first.
    pub async fn lock_active_sources(
        &self,
        unit_id: Uuid,
    ) -> Result<Vec<UnitCreditModel>, Box<dyn Error + Send + Sync>> {
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query(
                r#"
                SELECT * FROM unit_credit
                WHERE unit_id = $1 AND status = $2 AND amount > 0 AND remaining_amount > 0
                ORDER BY created_at, id
                FOR UPDATE
                "#,
            )
            .bind(unit_id)
            .bind(CreditStatus::Active)
            .fetch_all(&mut **transaction)
            .await?
        };

        rows.iter().map(UnitCreditModel::try_from_row).collect()
    }
}

#[async_trait]
impl LoadForUpdate<Postgres, UnitCreditModel> for UnitCreditRepositoryImpl {
    async fn load_for_update(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Option<UnitCreditModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ordered = lock_order(ids);
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM unit_credit WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&ordered)
                .fetch_all(&mut **transaction)
                .await?
        };

        let mut item_map = HashMap::new();
        for row in rows {
            let item = UnitCreditModel::try_from_row(&row)?;
            item_map.insert(item.id, item);
        }

        Ok(ids.iter().map(|id| item_map.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_utils::create_test_credit;
    use crate::test_helper::{create_test_audit_log, setup_test_context};
    use condo_core_api::domain::credit::CreditStatus;
    use condo_core_db::repository::create_batch::CreateBatch;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_lock_active_sources_skips_spent_entries() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.repos();
        let audit_log = create_test_audit_log(repos).await?;

        let tenant_id = Uuid::new_v4();
        let unit_id = Uuid::new_v4();
        let active = create_test_credit(tenant_id, unit_id, dec!(10.00), dec!(10.00));
        let mut spent = create_test_credit(tenant_id, unit_id, dec!(5.00), dec!(15.00));
        spent.remaining_amount = dec!(0);
        spent.status = CreditStatus::Consumed;
        repos
            .unit_credit_repository
            .create_batch(vec![active.clone(), spent], audit_log.id)
            .await?;

        let sources = repos.unit_credit_repository.lock_active_sources(unit_id).await?;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, active.id);

        Ok(())
    }
}
