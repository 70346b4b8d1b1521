use condo_core_db::models::payment::PaymentAllocationModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PaymentAllocationRepositoryImpl;

impl PaymentAllocationRepositoryImpl {
    pub async fn find_by_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Vec<PaymentAllocationModel>, Box<dyn Error + Send + Sync>> {
        let query = sqlx::query_as::<_, PaymentAllocationModel>(
            r#"
            SELECT id, payment_id, charge_id, amount_allocated, created_at
            FROM payment_allocation
            WHERE payment_id = $1
            ORDER BY charge_id
            "#,
        )
        .bind(payment_id);

        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        Ok(query.fetch_all(&mut **transaction).await?)
    }
}
