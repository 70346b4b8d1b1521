use condo_core_db::models::account::FolioCounterModel;
use std::error::Error;
use uuid::Uuid;

use crate::unit_of_work::Executor;

pub struct FolioCounterRepositoryImpl {
    pub executor: Executor,
}

impl FolioCounterRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// Creates the tenant's counter row if it does not exist yet. Returns `true` when a row was
    /// inserted.
    pub async fn provision(&self, tenant_id: Uuid) -> Result<bool, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let result = sqlx::query(
            r#"
            INSERT INTO folio_counter (tenant_id, current_folio_rec, current_folio_eg, updated_at)
            VALUES ($1, 0, 0, NOW())
            ON CONFLICT (tenant_id) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .execute(&mut **transaction)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Locks the tenant's counter row. Concurrent issuers queue here until the holder commits or
    /// rolls back, so a rolled back transaction never burns a folio.
    pub async fn load_for_update(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<FolioCounterModel>, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let counter = sqlx::query_as::<_, FolioCounterModel>(
            "SELECT * FROM folio_counter WHERE tenant_id = $1 FOR UPDATE",
        )
        .bind(tenant_id)
        .fetch_optional(&mut **transaction)
        .await?;
        Ok(counter)
    }

    pub async fn save(&self, counter: &FolioCounterModel) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let result = sqlx::query(
            r#"
            UPDATE folio_counter
            SET current_folio_rec = $2, current_folio_eg = $3, updated_at = $4
            WHERE tenant_id = $1
            "#,
        )
        .bind(counter.tenant_id)
        .bind(counter.current_folio_rec)
        .bind(counter.current_folio_eg)
        .bind(counter.updated_at)
        .execute(&mut **transaction)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("Folio counter for tenant {} does not exist", counter.tenant_id).into());
        }
        Ok(())
    }
}
