use condo_core_api::domain::reconciliation::ReconciliationStatus;
use condo_core_db::models::reconciliation::ReconciliationModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ReconciliationRepositoryImpl;

impl ReconciliationRepositoryImpl {
    /// Latest reconciled or closed snapshot of an account; its bank balance opens the next period.
    pub async fn find_last_locked(
        &self,
        financial_account_id: Uuid,
    ) -> Result<Option<ReconciliationModel>, Box<dyn Error + Send + Sync>> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let item = sqlx::query_as::<_, ReconciliationModel>(
            r#"
            SELECT * FROM reconciliation
            WHERE financial_account_id = $1 AND status IN ($2, $3)
            ORDER BY cutoff_date DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(financial_account_id)
        .bind(ReconciliationStatus::Conciliada)
        .bind(ReconciliationStatus::Cerrada)
        .fetch_optional(&mut **transaction)
        .await?;
        Ok(item)
    }
}
